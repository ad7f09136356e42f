use std::collections::HashMap;
use std::sync::Arc;

use dotnotes_shared::{Dot, ServerMessage};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::storage::Storage;

pub const MAX_DOTS: usize = 2000;
pub const MAX_TEXT_LEN: usize = 2000;

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<RwLock<Board>>,
    pub storage: Arc<dyn Storage>,
}

/// The single shared board plus every connected subscriber. Everything is
/// guarded by one lock; mutations and their broadcast happen under it so
/// peers observe changes in the same order they were applied.
#[derive(Default)]
pub struct Board {
    pub dots: Vec<Dot>,
    pub peers: HashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    pub dirty: bool,
}

impl Board {
    pub fn new(dots: Vec<Dot>) -> Self {
        Self {
            dots,
            peers: HashMap::new(),
            dirty: false,
        }
    }
}
