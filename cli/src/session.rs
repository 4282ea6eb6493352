use kaboom_core::{GameConfig, GameController, GameStatus, MarkOutcome, RevealOutcome};
use rand::Rng;
use rand::rngs::SmallRng;

use crate::input::{Command, HELP};
use crate::render::Renderer;

/// What to show after a command: a fresh frame, a message, or both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reply {
    pub frame: Option<String>,
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Continue(Reply),
    Quit,
}

/// One player's session: the controller, the board settings reused by every
/// new game, and the renderer frames are drawn with.
pub struct Session<R = SmallRng> {
    controller: GameController<R>,
    config: GameConfig,
    renderer: Box<dyn Renderer>,
}

impl<R: Rng> Session<R> {
    /// Starts the first game right away.
    pub fn new(
        mut controller: GameController<R>,
        config: GameConfig,
        renderer: Box<dyn Renderer>,
    ) -> anyhow::Result<Self> {
        controller.start_game(config)?;
        Ok(Self {
            controller,
            config,
            renderer,
        })
    }

    pub fn controller(&self) -> &GameController<R> {
        &self.controller
    }

    pub fn render(&self) -> anyhow::Result<String> {
        self.renderer.render(&self.controller.game_state())
    }

    pub fn apply(&mut self, command: Command) -> anyhow::Result<Step> {
        let reply = match command {
            Command::Reveal((row, col)) => {
                let outcome = self.controller.handle_cell_click(row, col);
                log::debug!("reveal ({}, {}): {:?}", row, col, outcome);
                Reply {
                    frame: outcome.has_update().then(|| self.render()).transpose()?,
                    message: self.reveal_message(outcome),
                }
            }
            Command::Flag((row, col)) => {
                let outcome = self.controller.handle_cell_right_click(row, col);
                log::debug!("flag ({}, {}): {:?}", row, col, outcome);
                Reply {
                    frame: outcome.has_update().then(|| self.render()).transpose()?,
                    message: self.flag_message(outcome),
                }
            }
            Command::NewGame => {
                self.controller.start_game(self.config)?;
                log::info!("New game started");
                Reply {
                    frame: Some(self.render()?),
                    message: None,
                }
            }
            Command::Help => Reply {
                frame: None,
                message: Some(HELP.to_string()),
            },
            Command::Quit => return Ok(Step::Quit),
        };
        Ok(Step::Continue(reply))
    }

    fn reveal_message(&self, outcome: RevealOutcome) -> Option<String> {
        match outcome {
            RevealOutcome::Won => Some("You won! Congratulations!".to_string()),
            RevealOutcome::HitMine => Some("Game over! You hit a mine.".to_string()),
            RevealOutcome::NoChange => self.idle_message(),
            RevealOutcome::Revealed(_) => None,
        }
    }

    fn flag_message(&self, outcome: MarkOutcome) -> Option<String> {
        match outcome {
            MarkOutcome::NoChange => self.idle_message(),
            MarkOutcome::Changed => None,
        }
    }

    fn idle_message(&self) -> Option<String> {
        match self.controller.status() {
            GameStatus::Won | GameStatus::Lost => {
                Some("The game is over, type `new` to play again.".to_string())
            }
            GameStatus::Idle | GameStatus::Playing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use kaboom_core::FirstClickPolicy;

    use super::*;
    use crate::render::{JsonRenderer, TextRenderer};

    fn session(seed: u64, config: GameConfig) -> Session {
        Session::new(
            GameController::with_seed(seed),
            config,
            Box::new(TextRenderer),
        )
        .unwrap()
    }

    fn reply(step: Step) -> Reply {
        match step {
            Step::Continue(reply) => reply,
            Step::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn starts_a_game_on_creation() {
        let session = session(1, GameConfig::BEGINNER);

        assert_eq!(session.controller().status(), GameStatus::Playing);
        assert!(session.render().unwrap().ends_with("status: playing, mines left: 10"));
    }

    #[test]
    fn deferred_layout_reports_configured_mines() {
        let session = Session::new(
            GameController::from_seed(1, FirstClickPolicy::ClearNeighborhood),
            GameConfig::BEGINNER,
            Box::new(TextRenderer),
        )
        .unwrap();

        assert!(session.render().unwrap().ends_with("status: playing, mines left: 10"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Session::new(
            GameController::with_seed(1),
            GameConfig::new_unchecked((2, 2), 4),
            Box::new(TextRenderer),
        );

        assert!(result.is_err());
    }

    #[test]
    fn winning_first_click_reports_once() {
        let mut session = session(2, GameConfig::new(2, 2, 3).unwrap());

        let first = reply(session.apply(Command::Reveal((0, 1))).unwrap());
        assert!(first.frame.unwrap().contains("status: won"));
        assert_eq!(first.message.as_deref(), Some("You won! Congratulations!"));

        let second = reply(session.apply(Command::Reveal((1, 1))).unwrap());
        assert_eq!(second.frame, None);
        assert_eq!(
            second.message.as_deref(),
            Some("The game is over, type `new` to play again.")
        );
    }

    #[test]
    fn revealing_a_mine_loses() {
        let mut session = session(3, GameConfig::new(4, 4, 10).unwrap());
        session.apply(Command::Reveal((0, 0))).unwrap();
        if session.controller().status() == GameStatus::Won {
            return;
        }

        let mine = session
            .controller()
            .board()
            .unwrap()
            .cells()
            .find(|cell| cell.is_mine())
            .unwrap()
            .coords();
        let lost = reply(session.apply(Command::Reveal(mine)).unwrap());

        assert_eq!(lost.message.as_deref(), Some("Game over! You hit a mine."));
        assert!(lost.frame.unwrap().contains('X'));
        assert_eq!(session.controller().hit_mine_cell(), Some(mine));
    }

    #[test]
    fn flag_redraws_and_new_game_resets() {
        let mut session = session(4, GameConfig::BEGINNER);

        let flagged = reply(session.apply(Command::Flag((0, 0))).unwrap());
        assert!(flagged.frame.unwrap().contains("mines left: 9"));

        let ignored = reply(session.apply(Command::Flag((42, 0))).unwrap());
        assert_eq!(ignored, Reply::default());

        let fresh = reply(session.apply(Command::NewGame).unwrap());
        assert!(fresh.frame.unwrap().contains("mines left: 10"));
        assert!(session.controller().is_first_click());
    }

    #[test]
    fn help_and_quit() {
        let mut session = session(5, GameConfig::BEGINNER);

        let help = reply(session.apply(Command::Help).unwrap());
        assert_eq!(help.message.as_deref(), Some(HELP));
        assert_eq!(session.apply(Command::Quit).unwrap(), Step::Quit);
    }

    #[test]
    fn json_session_emits_documents() {
        let mut session = Session::new(
            GameController::with_seed(6),
            GameConfig::BEGINNER,
            Box::new(JsonRenderer),
        )
        .unwrap();

        let frame = reply(session.apply(Command::Reveal((4, 4))).unwrap())
            .frame
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();

        assert!(value["board"].is_object());
    }
}
