//! Random playout evaluation.

use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::game::GamePosition;
use crate::search::SearchError;

/// Step cap for a single playout; exceeding it means the game failed to
/// terminate and the search cannot trust the result.
pub const MAX_ROLLOUT_ITERS: usize = 10_000;

/// Play uniformly random moves from `start` until the game ends or an exact
/// evaluation settles it, and report the value from the perspective of the
/// side to move at `start`.
///
/// Move parity is tracked so a value observed an odd number of plies deep is
/// sign-flipped back to the initial mover's frame.
pub(crate) fn rollout<G: GamePosition>(
    start: &G,
    rng: &mut ChaCha20Rng,
) -> Result<f64, SearchError> {
    let mut initial_heros_turn = true;
    let mut current = start.clone();
    let mut moves: Vec<G> = Vec::new();

    for _ in 0..MAX_ROLLOUT_ITERS {
        let sign = if initial_heros_turn { 1.0 } else { -1.0 };

        if current.is_terminal() {
            return Ok(sign * current.terminal_eval());
        }
        if let Some(exact) = current.non_terminal_eval() {
            return Ok(sign * exact);
        }

        moves.clear();
        current.legal_moves(&mut moves);
        if moves.is_empty() {
            return Err(SearchError::InvariantBroken(
                "non-terminal position produced no legal moves".into(),
            ));
        }
        let pick = rng.gen_range(0..moves.len());
        current = moves.swap_remove(pick);
        initial_heros_turn = !initial_heros_turn;
    }

    Err(SearchError::RolloutDiverged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{EndlessGame, MenuGame, NimGame};
    use rand::SeedableRng;

    #[test]
    fn immediate_terminal_reports_raw_eval() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let game = NimGame::new(0, 3);
        let value = rollout(&game, &mut rng).unwrap();
        assert!((value - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn one_ply_win_flips_parity() {
        // every move ends the game at -1 for the opponent, so the initial
        // mover always scores +1
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let game = MenuGame::new(vec![-1.0, -1.0, -1.0]);
        for _ in 0..10 {
            let value = rollout(&game, &mut rng).unwrap();
            assert!((value - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn exact_eval_short_circuits() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        // oracle at the start: no move is ever generated
        let game = NimGame::with_oracle(21, 3, 100);
        let value = rollout(&game, &mut rng).unwrap();
        assert!((value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rollout_values_stay_in_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let game = NimGame::new(20, 3);
        for _ in 0..50 {
            let value = rollout(&game, &mut rng).unwrap();
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn nonterminating_game_diverges() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let game = EndlessGame::default();
        assert!(matches!(
            rollout(&game, &mut rng),
            Err(SearchError::RolloutDiverged)
        ));
    }
}
