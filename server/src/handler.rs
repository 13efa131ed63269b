use crate::lifecycle::RoomManager;
use crate::relay::Relay;
use shared::{Action, ClientEvent, ConnectionId};

impl RoomManager {
    /// Routes one decoded client event to the component that owns it
    pub fn handle_event<R: Relay + ?Sized>(
        &mut self,
        relay: &mut R,
        connection: ConnectionId,
        event: ClientEvent,
    ) {
        match event {
            ClientEvent::JoinRoom {
                room,
                game,
                capacity,
            } => {
                self.join(relay, connection, &room, game, capacity);
            }
            ClientEvent::SendName { room, name } => {
                self.send_name(relay, connection, &room, &name);
            }
            ClientEvent::RpsChoice { room, choice } => {
                self.submit_action(relay, connection, &room, Action::Choice(choice));
            }
            ClientEvent::SubmitAnswer {
                room,
                answer,
                correct,
            } => {
                self.submit_action(
                    relay,
                    connection,
                    &room,
                    Action::Answer { answer, correct },
                );
            }
            ClientEvent::SendWord { room, word } => {
                self.send_word(relay, connection, &room, &word);
            }
            ClientEvent::PlayerMove { room, position } => {
                self.player_move(relay, connection, &room, position);
            }
            ClientEvent::LudoMove { room, token, value } => {
                self.ludo_move(relay, connection, &room, token, value);
            }
        }
    }
}
