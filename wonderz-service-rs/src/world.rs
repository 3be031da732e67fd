//! The three rooms of the wonderz easter egg
//!
//! Hard-coded world data. Rooms and items travel as lowercase tokens so
//! the service can stay stateless: the client echoes back its room and
//! inventory with every command.

pub const START_ROOM: &str = "lobby";

pub struct Room {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static [&'static str],
    /// (direction, destination room id)
    pub exits: &'static [(&'static str, &'static str)],
    /// Items lying around when the room is first seen.
    pub items: &'static [&'static str],
}

pub const ROOMS: &[Room] = &[
    Room {
        id: "lobby",
        name: "The Lobby",
        description: &[
            "A CRT monitor hums on a fake-wood desk. The search box in the",
            "middle of the screen is not connected to anything.",
            "A doorway leads NORTH into stacks of beige tower cases.",
        ],
        exits: &[("north", "archive")],
        items: &["floppy"],
    },
    Room {
        id: "archive",
        name: "The Archive",
        description: &[
            "Shelves of labeled floppies and zip disks. A service ladder",
            "bolted to the wall goes UP; the lobby is back SOUTH.",
            "A brass key hangs from a nail, almost like someone left it for you.",
        ],
        exits: &[("south", "lobby"), ("up", "rooftop")],
        items: &["key"],
    },
    Room {
        id: "rooftop",
        name: "The Rooftop",
        description: &[
            "Gravel, antennas, and a satellite dish pointed at nothing.",
            "A weatherproof terminal by the dish has a floppy drive.",
            "The ladder goes back DOWN.",
        ],
        exits: &[("down", "archive")],
        items: &[],
    },
];

/// The rooftop ladder stays locked until the key is carried.
pub const LOCKED_EXIT: (&str, &str) = ("archive", "up");
pub const LOCK_ITEM: &str = "key";

pub fn room(id: &str) -> Option<&'static Room> {
    ROOMS.iter().find(|room| room.id == id)
}

pub fn is_known_item(token: &str) -> bool {
    ROOMS.iter().any(|room| room.items.contains(&token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_is_connected_and_consistent() {
        for room_def in ROOMS {
            for (direction, destination) in room_def.exits {
                assert!(
                    room(destination).is_some(),
                    "{}: exit {direction} leads to unknown room {destination}",
                    room_def.id
                );
            }
        }
        assert!(room(START_ROOM).is_some());
        assert!(room(LOCKED_EXIT.0).is_some());
        assert!(is_known_item(LOCK_ITEM));
    }
}
