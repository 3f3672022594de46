use crate::constants::{EMPTY_TABLE, TABLE_HEADER};
use crate::db::models::{ChatBoard, ScoreRecord, UserId};

/// Board entries from highest to lowest score. Equal scores are ordered by user id so the
/// table never reshuffles between requests.
pub fn ranked(board: &ChatBoard) -> Vec<(&UserId, &ScoreRecord)> {
    let mut rows: Vec<_> = board.iter().collect();
    rows.sort_by(|(a_user, a), (b_user, b)| {
        b.score.cmp(&a.score).then_with(|| a_user.cmp(b_user))
    });

    rows
}

/// Renders the chat's leaderboard as the reply text.
pub fn render(board: &ChatBoard) -> String {
    if board.is_empty() {
        return EMPTY_TABLE.to_string();
    }

    let mut lines = Vec::with_capacity(board.len() + 1);
    lines.push(TABLE_HEADER.to_string());

    for (rank, (_, record)) in ranked(board).into_iter().enumerate() {
        lines.push(format!("{}. {} — {}", rank + 1, record.name, record.score));
    }

    lines.join("\n")
}

#[cfg(test)]
mod test {
    use num_bigint::BigInt;

    use super::*;

    fn board(rows: &[(&str, &str, i64)]) -> ChatBoard {
        rows.iter()
            .map(|(id, name, score)| {
                (
                    UserId::from(*id),
                    ScoreRecord {
                        name: name.to_string(),
                        score: BigInt::from(*score),
                        updated_at: None,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_board() {
        assert_eq!(render(&ChatBoard::default()), "Таблица пуста.");
    }

    #[test]
    fn test_renders_header_and_ranks() {
        let table = render(&board(&[("2", "Bob", -2), ("1", "Alice", 5)]));

        assert_eq!(
            table,
            "Баллы по философии:\n1. Alice — 5\n2. Bob — -2"
        );
    }

    #[test]
    fn test_scores_never_increase_down_the_table() {
        let b = board(&[
            ("1", "a", 3),
            ("2", "b", -7),
            ("3", "c", 10),
            ("4", "d", 0),
            ("5", "e", 3),
            ("6", "f", 999),
        ]);

        let scores: Vec<&BigInt> = ranked(&b).iter().map(|(_, r)| &r.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(scores.len(), 6);
    }

    #[test]
    fn test_renders_long_scores_in_full() {
        let mut b = board(&[("1", "Alice", 10)]);
        b.record_mut(UserId::from("2")).name = "Troll".into();
        b.record_mut(UserId::from("2")).score = "100000000000000000000".parse().unwrap();

        assert_eq!(
            render(&b),
            "Баллы по философии:\n1. Troll — 100000000000000000000\n2. Alice — 10"
        );
    }

    #[test]
    fn test_ties_follow_user_id() {
        let b = board(&[("30", "c", 1), ("10", "a", 1), ("20", "b", 1), ("5", "top", 2)]);
        let names: Vec<&str> = ranked(&b).iter().map(|(_, r)| r.name.as_str()).collect();

        assert_eq!(names, ["top", "a", "b", "c"]);
    }
}
