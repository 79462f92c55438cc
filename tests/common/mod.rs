pub mod database;
pub mod fixtures;

/// Builds the API service around a database and an image store.
#[macro_export]
macro_rules! test_app {
    ($db:expr, $storage:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data($storage.clone())
                .wrap(foodgram::middleware::ClientCtx::default())
                .configure(foodgram::web::configure),
        )
        .await
    };
}
