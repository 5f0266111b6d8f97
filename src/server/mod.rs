pub mod api;

use crate::persona::PersonaProxy;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    proxy: Arc<PersonaProxy>,
}

impl Server {
    pub fn new(addr: String, proxy: Arc<PersonaProxy>) -> Self {
        Self { addr, proxy }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(&self.addr, self.proxy.clone()).await
    }
}
