use crate::sequencer::Sequencer;
use std::sync::Arc;
use submitter::HttpChainClient;

#[derive(Clone)]
pub struct AppState {
    pub sequencer: Arc<Sequencer<HttpChainClient>>,
}

impl AppState {
    pub fn new(sequencer: Arc<Sequencer<HttpChainClient>>) -> Self {
        Self { sequencer }
    }
}
