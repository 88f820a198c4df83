mod action_player;
mod events;
mod model_player;
mod tweener;

pub use action_player::*;
pub use events::*;
pub use model_player::*;
pub use tweener::*;



#[cfg(test)]
mod model_player_tests;
