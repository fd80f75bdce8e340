use std::collections::{BTreeMap, BTreeSet};
use std::io;

use anyhow::Result;

use super::board::{GameBoard, Presenter, GAME_BUTTONS, GAME_ID_FIELD, HOME_FIELD, RESULT_FIELDS, VISITOR_FIELD};
use crate::libs::rpc::Transport;
use crate::libs::writing::{cc, Colors};
use crate::log;

/// Terminal rendition of the scoreboard page: fields live in memory, alerts
/// and the board are printed, confirmations are read from stdin.
#[derive(Default)]
pub struct ConsolePresenter {
    fields: BTreeMap<String, String>,
    disabled: BTreeSet<String>,
    status: String,
}

impl ConsolePresenter {
    pub fn is_disabled(&self, button: &str) -> bool {
        self.disabled.contains(button)
    }

    fn out(&self) -> Colors<'static> {
        Colors::new(io::stdout().lock())
    }

    pub fn prompt(&self, text: &str) -> Option<String> {
        self.out().cinput(text, cc::CYAN)
    }

    pub fn render(&self) {
        let mut out = self.out();
        let value = |name: &str| self.fields.get(name).cloned().unwrap_or_default();
        out.cprint(&format!("── {} ──", self.status), cc::DARK_GRAY);
        out.cprint(
            &format!(
                "game {:>4} | {} {} - {} {}",
                value(GAME_ID_FIELD),
                value(RESULT_FIELDS[0]),
                value(RESULT_FIELDS[1]),
                value(RESULT_FIELDS[3]),
                value(RESULT_FIELDS[2]),
            ),
            cc::BOLD,
        );
        let buttons: Vec<String> = GAME_BUTTONS
            .iter()
            .map(|b| {
                if self.is_disabled(b) {
                    format!("{}[{b}]{}", cc::DARK_GRAY, cc::RESET)
                } else {
                    format!("{}[{b}]{}", cc::LIGHT_BLUE, cc::RESET)
                }
            })
            .collect();
        out.cprint(&buttons.join(" "), cc::RESET);
    }

    pub fn help(&self) {
        let mut out = self.out();
        for line in [
            "create <home> <visitor>   new game",
            "load <id>                 show a game",
            "home_1 .. home_3          score 1/2/3 points for home",
            "visitor_1 .. visitor_3    score 1/2/3 points for visitor",
            "finish                    finish the loaded game",
            "show | help | quit",
        ] {
            out.cprint(line, cc::LIGHT_GRAY);
        }
    }
}

impl Presenter for ConsolePresenter {
    fn field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_string(), value.to_string());
    }

    fn set_disabled(&mut self, button: &str, disabled: bool) {
        if disabled {
            self.disabled.insert(button.to_string());
        } else {
            self.disabled.remove(button);
        }
    }

    fn alert(&mut self, message: &str) {
        self.out().cprint(message, cc::YELLOW);
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.out()
            .cinput(&format!("{message}? [y/N]"), cc::ORANGE)
            .is_some_and(|a| matches!(a.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Drive `board` from stdin until `quit` or EOF. Failed actions are shown as
/// alerts and the loop goes on.
pub async fn run_board<T: Transport>(board: &GameBoard<T>) -> Result<()> {
    let mut ui = ConsolePresenter::default();
    board.connect(&mut ui).await?;
    if let Some(address) = board.handle().address() {
        log!(cc::LIGHT_GRAY, "scoreboard contract {address}");
    }
    ui.help();
    ui.render();

    while let Some(line) = ui.prompt(">") {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, rest)) = words.split_first() else {
            continue;
        };
        let res = match cmd {
            "quit" | "exit" => break,
            "help" => {
                ui.help();
                continue;
            }
            "show" => {
                ui.render();
                continue;
            }
            "create" => {
                match rest {
                    [home, visitor] => {
                        ui.set_field(HOME_FIELD, home);
                        ui.set_field(VISITOR_FIELD, visitor);
                    }
                    _ => {
                        let home = ui.prompt("home team:").unwrap_or_default();
                        let visitor = ui.prompt("visitor team:").unwrap_or_default();
                        ui.set_field(HOME_FIELD, &home);
                        ui.set_field(VISITOR_FIELD, &visitor);
                    }
                }
                board.create_game(&mut ui).await.map(|_| ())
            }
            "load" => {
                if let Some(id) = rest.first() {
                    ui.set_field(GAME_ID_FIELD, id);
                }
                board.load_game(&mut ui).await.map(|_| ())
            }
            button if ui.is_disabled(button) => {
                ui.alert(&format!("{button} is disabled: the game is finished"));
                continue;
            }
            button => board.press(button, &mut ui).await.map(|_| ()),
        };
        match res {
            Ok(()) => ui.render(),
            Err(e) => ui.alert(&format!("{e:#}")),
        }
    }
    Ok(())
}
