//! Property tests for player rotation and per-question spent accounting.

use proptest::prelude::*;
use trivia_engine::game::{
    BoardRound, CellDescription, CellKind, ColumnDescription, PlayerRegistry,
};

fn registry_of(count: usize, enabled_mask: u8) -> PlayerRegistry {
    let mut registry = PlayerRegistry::default();
    for index in 0..count {
        registry.add(&format!("player-{index}"));
        if enabled_mask & (1 << index) == 0 {
            registry.set_enabled(&format!("player-{index}"), false);
        }
    }
    registry
}

fn one_column_board(rows: usize) -> BoardRound {
    BoardRound::new(vec![ColumnDescription {
        category: "General".to_string(),
        cells: (0..rows)
            .map(|row| CellDescription {
                question: format!("question {row}"),
                answer: format!("answer {row}"),
                value: (row as i64 + 1) * 100,
                kind: CellKind::Text,
            })
            .collect(),
    }])
}

proptest! {
    #[test]
    fn rotation_always_lands_on_an_enabled_player(
        count in 1usize..8,
        enabled_mask in any::<u8>(),
    ) {
        let mut registry = registry_of(count, enabled_mask);
        let before: Vec<String> = registry.iter().map(|p| p.name.clone()).collect();
        let any_enabled = registry.enabled_count() > 0;

        registry.rotate_active();

        prop_assert_eq!(registry.len(), count);
        if any_enabled {
            prop_assert!(registry.active().is_some_and(|p| p.enabled));
        } else {
            // Guarded: with nobody enabled the order is left untouched.
            let after: Vec<String> = registry.iter().map(|p| p.name.clone()).collect();
            prop_assert_eq!(before, after);
        }
    }

    #[test]
    fn rotation_preserves_membership(
        count in 1usize..8,
        enabled_mask in any::<u8>(),
        turns in 1usize..16,
    ) {
        let mut registry = registry_of(count, enabled_mask | 1);
        let mut before: Vec<String> = registry.iter().map(|p| p.name.clone()).collect();

        for _ in 0..turns {
            registry.rotate_active();
        }

        let mut after: Vec<String> = registry.iter().map(|p| p.name.clone()).collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn unspent_count_identity_holds(
        count in 1usize..6,
        spent_mask in any::<u8>(),
        enabled_mask in any::<u8>(),
    ) {
        let registry = registry_of(count, enabled_mask);
        let mut board = one_column_board(3);
        board.set_question_state(0, 0, &registry).unwrap();

        for index in 0..count {
            if spent_mask & (1 << index) != 0 {
                let name = format!("player-{index}");
                board.set_current_player(&name, &registry);
                board.set_player_spent();
            }
        }

        let spent_and_enabled = registry
            .iter()
            .filter(|p| p.enabled && board.is_player_spent(&p.name))
            .count();
        prop_assert_eq!(
            board.count_unspent_players(&registry) + spent_and_enabled,
            registry.enabled_count()
        );
    }

    #[test]
    fn spent_cells_never_reset_within_a_round(
        rows in 1usize..5,
        reveal_row_seed in any::<usize>(),
    ) {
        let registry = registry_of(2, 0b11);
        let mut board = one_column_board(rows);
        let reveal_row = reveal_row_seed % rows;

        board.set_question_state(0, reveal_row, &registry).unwrap();
        board.set_reveal_state(&registry);
        prop_assert!(board.is_spent(0, reveal_row).unwrap());

        // Returning to board display and selecting other cells must not
        // clear the spent flag.
        board.set_board_state(&registry);
        prop_assert!(board.is_spent(0, reveal_row).unwrap());
        for row in 0..rows {
            if row != reveal_row {
                board.set_question_state(0, row, &registry).unwrap();
                prop_assert!(board.is_spent(0, reveal_row).unwrap());
            }
        }
    }
}
