//! Host-owned game state the periodic units read and mutate.
//!
//! The scheduler never owns these records. The host lends the world
//! to every `Scheduler::update` call through the TickContext.

use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One placed piece of content (a house, a plantation...) owned by a player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnedContent {
    pub id:              EntityId,
    pub content_type:    String,
    /// Profit after modifiers, precomputed by the host.
    pub modified_profit: f64,
}

impl OwnedContent {
    pub fn new(id: impl Into<EntityId>, content_type: impl Into<String>, profit: f64) -> Self {
        Self {
            id:              id.into(),
            content_type:    content_type.into(),
            modified_profit: profit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id:            EntityId,
    pub name:          String,
    pub money:         f64,
    /// Content grouped by content type.
    pub owned_content: HashMap<String, Vec<OwnedContent>>,
}

impl Player {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, money: f64) -> Self {
        Self {
            id:            id.into(),
            name:          name.into(),
            money,
            owned_content: HashMap::new(),
        }
    }

    pub fn add_money(&mut self, amount: f64) {
        self.money += amount;
    }

    pub fn add_content(&mut self, content: OwnedContent) {
        self.owned_content
            .entry(content.content_type.clone())
            .or_default()
            .push(content);
    }

    /// Owned content of one type. Empty when the player has none.
    pub fn content_of_type(&self, content_type: &str) -> &[OwnedContent] {
        self.owned_content
            .get(content_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameWorld {
    pub players: Vec<Player>,
}

impl GameWorld {
    pub fn new() -> Self { Self::default() }

    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}
