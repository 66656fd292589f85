//! Navigable paths for sessions.
//!
//! The canonical path of a game is `/game/{address}/{name}`. The older
//! `/game/{address}` and `/game/{address}:{name}` forms still parse.

use crate::error::ClientError;
use crate::identifier::{GameIdentifier, RawIdentifier};
use tracing::instrument;

const GAME_SEGMENT: &str = "game";

/// Where the client is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Main menu: no game selected.
    MainMenu,
    /// Viewing one game; the reference is not resolved yet.
    Game(RawIdentifier),
}

impl Route {
    /// Parses a path.
    #[instrument]
    pub fn parse(path: &str) -> Result<Self, ClientError> {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Ok(Route::MainMenu),
            [GAME_SEGMENT, reference] => Ok(Route::Game(RawIdentifier::parse(reference))),
            [GAME_SEGMENT, address, name] => Ok(Route::Game(RawIdentifier::Pair {
                address: address.to_string(),
                name: name.to_string(),
            })),
            _ => Err(ClientError::InvalidIdentifier(format!(
                "unrecognized path {:?}",
                path
            ))),
        }
    }

    /// Canonical path for a resolved game.
    pub fn path_for(id: &GameIdentifier) -> String {
        format!(
            "/{}/{}/{}",
            GAME_SEGMENT,
            id.creator_address(),
            id.game_name()
        )
    }

    /// Canonical path for the main menu.
    pub fn main_menu_path() -> &'static str {
        "/"
    }
}
