//! Best-effort parser for the line-oriented match report format.
//!
//! Every line is `KEY VALUE`. `Q` opens a team stanza and `P` a player
//! stanza; `n`, `t` and `e` lines belong to whichever stanza is open, and any
//! other key is global match metadata. Lines that do not split are skipped.
//! Stanza lines seen before the first marker are carried into the first
//! stanza that opens.

use crate::models::report::{MatchReport, StanzaBlock};

enum State {
    /// No marker seen yet; holds lines waiting for the first stanza.
    Idle(StanzaBlock),
    InTeam(StanzaBlock),
    InPlayer(StanzaBlock),
}

impl State {
    fn block_mut(&mut self) -> &mut StanzaBlock {
        match self {
            State::Idle(block) | State::InTeam(block) | State::InPlayer(block) => block,
        }
    }

    /// Closes the current stanza and returns the block the next one starts
    /// from.
    fn close(self, report: &mut MatchReport) -> StanzaBlock {
        match self {
            State::Idle(pending) => pending,
            open => {
                open.flush_into(report);
                StanzaBlock::new()
            }
        }
    }

    fn flush_into(self, report: &mut MatchReport) {
        match self {
            State::InTeam(block) if !block.is_empty() => report.teams.push(block),
            State::InPlayer(block) if !block.is_empty() => report.players.push(block),
            _ => {}
        }
    }
}

const STANZA_KEYS: &[&str] = &["P", "Q", "n", "e", "t", "i"];

pub fn parse(body: &str) -> MatchReport {
    let mut report = MatchReport::default();
    let mut state = State::Idle(StanzaBlock::new());

    for line in body.lines() {
        let Some((key, value)) = line.trim().split_once(' ') else {
            continue;
        };

        if !STANZA_KEYS.contains(&key) {
            report.meta.insert(key.to_string(), value.to_string());
            continue;
        }

        match key {
            "P" | "Q" => {
                let mut block = std::mem::replace(&mut state, State::Idle(StanzaBlock::new()))
                    .close(&mut report);
                block.insert(key.to_string(), value.to_string());
                state = if key == "P" {
                    State::InPlayer(block)
                } else {
                    State::InTeam(block)
                };
            }
            "e" => {
                if let Some((subkey, subvalue)) = value.split_once(' ') {
                    state
                        .block_mut()
                        .insert(subkey.to_string(), subvalue.to_string());
                }
            }
            "n" | "t" => {
                state.block_mut().insert(key.to_string(), value.to_string());
            }
            _ => {}
        }
    }

    state.flush_into(&mut report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(pairs: &[(&str, &str)]) -> StanzaBlock {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_player_stanzas_collect_event_lines() {
        let report = parse("P 1\nn Bob\ne scoreboard-kills 5\nP 2\nn Ann\n");
        assert_eq!(report.players.len(), 2);
        assert_eq!(
            report.players[0],
            block(&[("P", "1"), ("n", "Bob"), ("scoreboard-kills", "5")])
        );
        assert_eq!(report.players[1], block(&[("P", "2"), ("n", "Ann")]));
        assert!(report.teams.is_empty());
    }

    #[test]
    fn test_meta_is_global_and_overwritten() {
        let report = parse("I abc\nG ctf\nP 7\nM campgrounds\nG tdm\n");
        assert_eq!(report.meta("I"), Some("abc"));
        assert_eq!(report.meta("G"), Some("tdm"));
        assert_eq!(report.meta("M"), Some("campgrounds"));
        // metadata lines never land inside the open stanza
        assert_eq!(report.players, vec![block(&[("P", "7")])]);
    }

    #[test]
    fn test_teams_and_players_are_separated() {
        let body = "Q team#1\ne scoreboard-caps 3\nP 10\nt 1\nQ team#2\ne scoreboard-caps 1\nP 11\nt 2";
        let report = parse(body);
        assert_eq!(report.teams.len(), 2);
        assert_eq!(report.players.len(), 2);
        assert_eq!(report.teams[1], block(&[("Q", "team#2"), ("scoreboard-caps", "1")]));
        assert_eq!(report.players[1], block(&[("P", "11"), ("t", "2")]));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let body = "garbage\n\nP 1\ne lonely\nn  spaced\n   \nI m1";
        let report = parse(body);
        assert_eq!(report.meta("I"), Some("m1"));
        assert_eq!(report.players, vec![block(&[("P", "1"), ("n", " spaced")])]);
    }

    #[test]
    fn test_stanza_lines_before_first_marker_join_first_stanza() {
        let report = parse("n nobody\ne alivetime 10\nP 1\nP 2");
        assert_eq!(
            report.players,
            vec![
                block(&[("P", "1"), ("n", "nobody"), ("alivetime", "10")]),
                block(&[("P", "2")]),
            ]
        );
    }

    #[test]
    fn test_lines_without_any_marker_produce_no_block() {
        let report = parse("I m1\nn nobody\nt 1");
        assert!(report.players.is_empty());
        assert!(report.teams.is_empty());
        assert_eq!(report.meta("I"), Some("m1"));
    }

    #[test]
    fn test_back_to_back_markers_each_produce_a_block() {
        let report = parse("P 1\nP 2\nQ team#1");
        assert_eq!(report.players.len() + report.teams.len(), 3);
    }

    #[test]
    fn test_parse_is_repeatable() {
        let body = "I x\nQ team#1\ne scoreboard-score 10\nP 5\nn A\ne alivetime 900";
        assert_eq!(parse(body), parse(body));
    }
}
