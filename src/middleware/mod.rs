mod client_ctx;

pub use client_ctx::{authenticate_by_token, ClientCtx, ClientCtxInner};
