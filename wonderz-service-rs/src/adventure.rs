//! Command handling for the text adventure
//!
//! A stateless state machine: every request carries the client's room and
//! inventory tokens, every response returns the updated pair plus output
//! lines. Unknown verbs answer in-fiction with the error flag set.

use crate::config::Config;
use crate::world::{LOCK_ITEM, LOCKED_EXIT, START_ROOM, is_known_item, room};
use serde::Serialize;

const MAX_COMMAND_LENGTH: usize = 256;
const MAX_WORDS: usize = 8;

#[derive(Debug)]
pub struct AdventureHandlers {
    config: Config,
}

impl AdventureHandlers {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn handle_execute(
        &self,
        input: &str,
        client_room: Option<&str>,
        client_inventory: &[String],
    ) -> CommandOutcome {
        let trimmed = input.trim();

        if trimmed.len() > MAX_COMMAND_LENGTH {
            return CommandOutcome::validation_error(format!(
                "Command length exceeds limit of {MAX_COMMAND_LENGTH}"
            ));
        }

        let current_room = match client_room {
            None | Some("") => START_ROOM,
            Some(id) => match room(id) {
                Some(room) => room.id,
                None => return CommandOutcome::validation_error("Unknown room".to_string()),
            },
        };
        let mut inventory: Vec<String> = client_inventory
            .iter()
            .map(|item| item.trim().to_lowercase())
            .filter(|item| is_known_item(item))
            .collect();
        inventory.dedup();

        if trimmed.is_empty() {
            return CommandOutcome::ok(CommandState {
                room: current_room.to_string(),
                inventory,
                output: vec![],
                error: false,
                clear: false,
                ended: false,
            });
        }

        let mut words = trimmed.split_whitespace();
        let verb = words.next().unwrap_or("").to_lowercase();
        let args: Vec<String> = words.map(|word| word.to_lowercase()).collect();
        if args.len() + 1 > MAX_WORDS {
            return CommandOutcome::validation_error(format!(
                "Too many words; maximum is {MAX_WORDS}"
            ));
        }

        let state = CommandState {
            room: current_room.to_string(),
            inventory,
            output: vec![],
            error: false,
            clear: false,
            ended: false,
        };

        match verb.as_str() {
            "help" => Ok(help(state, &self.config)),
            "look" => Ok(look(state)),
            "go" => go(state, args.first().map(String::as_str)),
            "take" => take(state, args.first().map(String::as_str)),
            "use" => use_item(state, args.first().map(String::as_str)),
            "inventory" | "inv" => Ok(show_inventory(state)),
            "clear" => Ok(CommandState {
                clear: true,
                ..state
            }),
            _ => Err(CommandState {
                output: vec![
                    format!("The search box blinks at \"{verb}\" and does nothing."),
                    "Type `help` for the words it understands.".to_string(),
                ],
                error: true,
                ..state
            }),
        }
        .map_or_else(CommandOutcome::rejected, CommandOutcome::ok)
    }

    pub fn handle_info(&self, motd: Vec<String>) -> InfoResponse {
        InfoResponse {
            room: START_ROOM.to_string(),
            verbs: supported_verbs(),
            motd,
        }
    }
}

#[derive(Debug, Clone)]
struct CommandState {
    room: String,
    inventory: Vec<String>,
    output: Vec<String>,
    error: bool,
    clear: bool,
    ended: bool,
}

fn help(mut state: CommandState, config: &Config) -> CommandState {
    let mut lines = vec![
        "The search box understands:".to_string(),
        "  look                  describe the room".to_string(),
        "  go <direction>        move between rooms".to_string(),
        "  take <item>           pick something up".to_string(),
        "  use <item>            try an item here".to_string(),
        "  inventory             list what you carry".to_string(),
        "  clear                 wipe the screen".to_string(),
    ];
    if !config.motd_path.is_empty() {
        lines.push("There is a message of the day. Somewhere.".to_string());
    }
    state.output = lines;
    state
}

fn look(mut state: CommandState) -> CommandState {
    let Some(here) = room(&state.room) else {
        state.output = vec!["You are nowhere. That should not happen.".to_string()];
        state.error = true;
        return state;
    };
    let mut lines = vec![format!("== {} ==", here.name)];
    lines.extend(here.description.iter().map(|line| line.to_string()));
    let visible: Vec<&str> = here
        .items
        .iter()
        .copied()
        .filter(|item| !state.inventory.iter().any(|held| held == item))
        .collect();
    if !visible.is_empty() {
        lines.push(format!("You can see: {}.", visible.join(", ")));
    }
    let exits: Vec<&str> = here.exits.iter().map(|(direction, _)| *direction).collect();
    lines.push(format!("Exits: {}.", exits.join(", ")));
    state.output = lines;
    state
}

fn go(
    mut state: CommandState,
    direction: Option<&str>,
) -> Result<CommandState, CommandState> {
    let Some(direction) = direction else {
        state.output = vec!["Go where? Try `go north`.".to_string()];
        state.error = true;
        return Err(state);
    };
    let here = room(&state.room).ok_or_else(|| state.clone())?;
    let Some((_, destination)) = here
        .exits
        .iter()
        .find(|(exit_direction, _)| *exit_direction == direction)
    else {
        state.output = vec![format!("There is no way {direction} from here.")];
        state.error = true;
        return Err(state);
    };

    if (here.id, direction) == LOCKED_EXIT
        && !state.inventory.iter().any(|item| item == LOCK_ITEM)
    {
        state.output = vec![
            "The hatch above the ladder is locked.".to_string(),
            "A keyhole glints in the dark.".to_string(),
        ];
        state.error = true;
        return Err(state);
    }

    state.room = destination.to_string();
    Ok(look(state))
}

fn take(mut state: CommandState, item: Option<&str>) -> Result<CommandState, CommandState> {
    let Some(item) = item else {
        state.output = vec!["Take what?".to_string()];
        state.error = true;
        return Err(state);
    };
    let here = room(&state.room).ok_or_else(|| state.clone())?;
    if state.inventory.iter().any(|held| held == item) {
        state.output = vec![format!("You are already carrying the {item}.")];
        state.error = true;
        return Err(state);
    }
    if !here.items.contains(&item) {
        state.output = vec![format!("There is no {item} here.")];
        state.error = true;
        return Err(state);
    }
    state.inventory.push(item.to_string());
    state.output = vec![format!("Taken. The {item} is yours now.")];
    Ok(state)
}

fn use_item(mut state: CommandState, item: Option<&str>) -> Result<CommandState, CommandState> {
    let Some(item) = item else {
        state.output = vec!["Use what?".to_string()];
        state.error = true;
        return Err(state);
    };
    if !state.inventory.iter().any(|held| held == item) {
        state.output = vec![format!("You are not carrying a {item}.")];
        state.error = true;
        return Err(state);
    }

    match (state.room.as_str(), item) {
        ("archive", "key") => {
            state.output = vec![
                "You try the key on the hatch above the ladder. It fits.".to_string(),
                "Carrying it is enough; just `go up`.".to_string(),
            ];
        }
        ("rooftop", "floppy") => {
            state.output = vec![
                "The drive whirs, grinds, and accepts the floppy.".to_string(),
                "The satellite dish shudders and swings toward the horizon.".to_string(),
                "Somewhere, a modem answers. You have wonderz'd the internet.".to_string(),
                "*** THE END ***".to_string(),
            ];
            state.ended = true;
        }
        _ => {
            state.output = vec![format!("The {item} does nothing useful here.")];
            state.error = true;
            return Err(state);
        }
    }
    Ok(state)
}

fn show_inventory(mut state: CommandState) -> CommandState {
    state.output = if state.inventory.is_empty() {
        vec!["You carry nothing but optimism.".to_string()]
    } else {
        vec![format!("You are carrying: {}.", state.inventory.join(", "))]
    };
    state
}

pub fn supported_verbs() -> Vec<String> {
    ["look", "go", "take", "use", "inventory", "help", "clear"]
        .iter()
        .map(|verb| verb.to_string())
        .collect()
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub room: String,
    #[serde(rename = "supportedVerbs")]
    pub verbs: Vec<String>,
    pub motd: Vec<String>,
}

#[derive(Debug)]
pub struct CommandOutcome {
    pub status: u16,
    pub payload: serde_json::Value,
}

impl CommandOutcome {
    fn from_state(state: CommandState, status: u16) -> Self {
        let mut payload = serde_json::json!({
            "room": state.room,
            "inventory": state.inventory,
            "output": state.output,
            "error": state.error,
        });
        if state.clear {
            payload["clear"] = serde_json::json!(true);
        }
        if state.ended {
            payload["ended"] = serde_json::json!(true);
        }
        Self { status, payload }
    }

    fn ok(state: CommandState) -> Self {
        Self::from_state(state, 200)
    }

    fn rejected(state: CommandState) -> Self {
        Self::from_state(state, 400)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self {
            status: 422,
            payload: serde_json::json!({ "message": message.into() }),
        }
    }

    pub fn malformed_body() -> Self {
        Self {
            status: 400,
            payload: serde_json::json!({ "message": "Malformed JSON body" }),
        }
    }

    pub fn invalid_json() -> Self {
        Self {
            status: 400,
            payload: serde_json::json!({ "message": "Invalid JSON payload" }),
        }
    }
}
