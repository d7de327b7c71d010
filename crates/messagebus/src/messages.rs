use domain::{Command, Event};

/// A unit of work for the bus: either an intent (command) or a fact (event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Command(Command),
    Event(Event),
}

impl Message {
    /// Returns the message type name used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Message::Command(command) => command.name(),
            Message::Event(event) => event.name(),
        }
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_delegates_to_the_inner_message() {
        let message: Message = Command::allocate("o1", "RETRO-CLOCK", 10).into();
        assert_eq!(message.name(), "Allocate");

        let message: Message = Event::out_of_stock("RETRO-CLOCK").into();
        assert_eq!(message.name(), "OutOfStock");
    }
}
