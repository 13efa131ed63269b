//! Game-outcome rules. Pure functions, no room state.

use shared::{
    Action, ConnectionId, Outcome, RpsChoice, LUDO_DIE_FACES, LUDO_TOKENS, LUDO_WIN_POSITION,
    WORD_POINTS_PER_LETTER,
};
use std::collections::HashMap;

/// Cyclic dominance from `mine`'s side
pub fn rps_outcome(mine: RpsChoice, theirs: RpsChoice) -> Outcome {
    if mine == theirs {
        Outcome::Draw
    } else if mine.beats() == theirs {
        Outcome::Win
    } else {
        Outcome::Lose
    }
}

/// A correct answer beats a wrong one; matching correctness is a draw
pub fn trivia_outcome(mine_correct: bool, theirs_correct: bool) -> Outcome {
    match (mine_correct, theirs_correct) {
        (true, false) => Outcome::Win,
        (false, true) => Outcome::Lose,
        _ => Outcome::Draw,
    }
}

fn compare(mine: &Action, theirs: &Action) -> Outcome {
    match (mine, theirs) {
        (Action::Choice(a), Action::Choice(b)) => rps_outcome(*a, *b),
        (Action::Answer { correct: a, .. }, Action::Answer { correct: b, .. }) => {
            trivia_outcome(*a, *b)
        }
        _ => Outcome::Draw,
    }
}

/// Outcome for every member, in `members` order.
///
/// A member loses if anyone beats it, wins if it beats someone and loses to
/// no one, and draws otherwise. With two members this yields the mirrored
/// win/lose pair. Returns None unless every member has an action and there
/// are at least two of them.
pub fn round_outcomes(
    members: &[ConnectionId],
    buffer: &HashMap<ConnectionId, Action>,
) -> Option<Vec<Outcome>> {
    if members.len() < 2 {
        return None;
    }

    let actions: Vec<&Action> = members
        .iter()
        .map(|member| buffer.get(member))
        .collect::<Option<_>>()?;

    let outcomes = actions
        .iter()
        .enumerate()
        .map(|(i, mine)| {
            let mut won = false;
            for (j, theirs) in actions.iter().enumerate() {
                if i == j {
                    continue;
                }
                match compare(mine, theirs) {
                    Outcome::Lose => return Outcome::Lose,
                    Outcome::Win => won = true,
                    Outcome::Draw => {}
                }
            }
            if won {
                Outcome::Win
            } else {
                Outcome::Draw
            }
        })
        .collect();

    Some(outcomes)
}

/// Trims and lowercases a submitted word; None if nothing is left.
///
/// Inner spaces are kept and count towards the score.
pub fn normalize_word(raw: &str) -> Option<String> {
    let word = raw.trim().to_lowercase();
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

/// Points for a word: a fixed amount per character
pub fn word_score(word: &str) -> u32 {
    u32::try_from(word.chars().count())
        .unwrap_or(u32::MAX)
        .saturating_mul(WORD_POINTS_PER_LETTER)
}

/// New position of a token after moving `value` squares, if the move is legal
pub fn ludo_step(position: u8, value: u8) -> Option<u8> {
    if !(1..=LUDO_DIE_FACES).contains(&value) {
        return None;
    }
    let next = position.checked_add(value)?;
    (next <= LUDO_WIN_POSITION).then_some(next)
}

pub fn ludo_finished(tokens: &[u8; LUDO_TOKENS]) -> bool {
    tokens.iter().all(|&position| position >= LUDO_WIN_POSITION)
}

pub fn ludo_next_turn(turn: usize, members: usize) -> usize {
    if members == 0 {
        0
    } else {
        (turn + 1) % members
    }
}

/// Keeps the turn on the same member after the member at `removed` leaves.
///
/// If the departing member held the turn it passes to whoever followed them.
pub fn ludo_turn_after_leave(turn: usize, removed: usize, remaining: usize) -> usize {
    if remaining == 0 {
        return 0;
    }
    let turn = if removed < turn { turn - 1 } else { turn };
    if turn >= remaining {
        0
    } else {
        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::RpsChoice::{Paper, Rock, Scissors};

    fn buffer(entries: &[(ConnectionId, Action)]) -> HashMap<ConnectionId, Action> {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_rps_dominance_table() {
        assert_eq!(rps_outcome(Rock, Scissors), Outcome::Win);
        assert_eq!(rps_outcome(Paper, Rock), Outcome::Win);
        assert_eq!(rps_outcome(Scissors, Paper), Outcome::Win);
        assert_eq!(rps_outcome(Scissors, Rock), Outcome::Lose);
        assert_eq!(rps_outcome(Rock, Paper), Outcome::Lose);
        assert_eq!(rps_outcome(Paper, Scissors), Outcome::Lose);
        for choice in [Rock, Paper, Scissors] {
            assert_eq!(rps_outcome(choice, choice), Outcome::Draw);
        }
    }

    #[test]
    fn test_round_outcomes_are_mirrored() {
        // A plays X, B plays whatever beats X
        for x in [Rock, Paper, Scissors] {
            let beats_x = [Rock, Paper, Scissors]
                .into_iter()
                .find(|c| c.beats() == x)
                .unwrap();
            let buf = buffer(&[(1, Action::Choice(x)), (2, Action::Choice(beats_x))]);

            let outcomes = round_outcomes(&[1, 2], &buf).unwrap();
            assert_eq!(outcomes, vec![Outcome::Lose, Outcome::Win]);
        }
    }

    #[test]
    fn test_round_outcomes_draw() {
        let buf = buffer(&[(1, Action::Choice(Paper)), (2, Action::Choice(Paper))]);
        assert_eq!(
            round_outcomes(&[1, 2], &buf).unwrap(),
            vec![Outcome::Draw, Outcome::Draw]
        );
    }

    #[test]
    fn test_round_outcomes_need_everyone() {
        let buf = buffer(&[(1, Action::Choice(Rock))]);
        assert!(round_outcomes(&[1, 2], &buf).is_none());
        assert!(round_outcomes(&[1], &buf).is_none());
    }

    #[test]
    fn test_trivia_correctness_decides() {
        let answer = |correct| Action::Answer {
            answer: "Paris".to_string(),
            correct,
        };
        let buf = buffer(&[(1, answer(true)), (2, answer(false))]);
        assert_eq!(
            round_outcomes(&[1, 2], &buf).unwrap(),
            vec![Outcome::Win, Outcome::Lose]
        );

        let buf = buffer(&[(1, answer(false)), (2, answer(false))]);
        assert_eq!(
            round_outcomes(&[1, 2], &buf).unwrap(),
            vec![Outcome::Draw, Outcome::Draw]
        );
    }

    #[test]
    fn test_word_normalization_and_score() {
        assert_eq!(normalize_word("  Rust "), Some("rust".to_string()));
        assert_eq!(normalize_word("   "), None);
        assert_eq!(normalize_word("Ice Cream"), Some("ice cream".to_string()));
        assert_eq!(word_score("ice cream"), 90);
        assert_eq!(word_score("rust"), 40);
    }

    #[test]
    fn test_ludo_step_limits() {
        assert_eq!(ludo_step(0, 6), Some(6));
        assert_eq!(ludo_step(50, 6), Some(56));
        assert_eq!(ludo_step(51, 6), None);
        assert_eq!(ludo_step(3, 0), None);
        assert_eq!(ludo_step(3, 7), None);
    }

    #[test]
    fn test_ludo_finish_detection() {
        assert!(ludo_finished(&[56; LUDO_TOKENS]));
        assert!(!ludo_finished(&[56, 56, 56, 55]));
    }

    #[test]
    fn test_ludo_turn_rotation() {
        assert_eq!(ludo_next_turn(0, 3), 1);
        assert_eq!(ludo_next_turn(2, 3), 0);
        assert_eq!(ludo_next_turn(0, 0), 0);
    }

    #[test]
    fn test_ludo_turn_survives_departures() {
        // members [a, b, c], c to move, a leaves -> c is now index 1
        assert_eq!(ludo_turn_after_leave(2, 0, 2), 1);
        // b to move and b leaves -> c (now index 1) moves
        assert_eq!(ludo_turn_after_leave(1, 1, 2), 1);
        // c to move and c leaves -> wraps to a
        assert_eq!(ludo_turn_after_leave(2, 2, 2), 0);
        assert_eq!(ludo_turn_after_leave(0, 0, 0), 0);
    }
}
