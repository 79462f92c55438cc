pub mod app_config;
pub mod db;
pub mod error;
pub mod ingredients;
pub mod middleware;
pub mod orm;
pub mod pagination;
pub mod recipes;
pub mod relations;
pub mod schema;
pub mod shopping_list;
pub mod storage;
pub mod tags;
pub mod user;
pub mod validators;
pub mod web;
