use crate::models::report::{MatchReport, StanzaBlock};

/// Prefix that marks the restricted-loadout (instagib) variant of a gametype.
pub const INSTAGIB_MARKER: char = 'i';

/// Every weapon except the two an instagib loadout carries (railgun and
/// gauntlet).
const NON_INSTAGIB_WEAPONS: &[&str] = &[
    "mg", "sg", "gl", "rl", "lg", "pg", "hmg", "bfg", "cg", "ng", "pm", "gh",
];

fn never_fired(player: &StanzaBlock, weapon: &str) -> bool {
    match player.get(&format!("acc-{}-cnt-fired", weapon)) {
        Some(fired) => fired.trim() == "0",
        None => true,
    }
}

pub fn is_instagib(report: &MatchReport) -> bool {
    report.players.iter().all(|player| {
        NON_INSTAGIB_WEAPONS
            .iter()
            .all(|weapon| never_fired(player, weapon))
    })
}

/// Retags the gametype as its instagib variant when no player fired a
/// non-instagib weapon. Returns whether the report was retagged.
pub fn classify(report: &mut MatchReport) -> bool {
    if !is_instagib(report) {
        return false;
    }
    match report.meta.get_mut("G") {
        Some(gametype) => {
            gametype.insert(0, INSTAGIB_MARKER);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stanza;

    #[test]
    fn test_players_without_weapon_fields_are_instagib() {
        let mut report = stanza::parse("G ctf\nP 1\nn A\nP 2\nn B");
        assert!(classify(&mut report));
        assert_eq!(report.meta("G"), Some("ictf"));
    }

    #[test]
    fn test_zero_counts_and_railgun_use_are_instagib() {
        let body = "G tdm\nP 1\ne acc-rg-cnt-fired 40\ne acc-gt-cnt-fired 2\ne acc-rl-cnt-fired 0\nP 2\ne acc-mg-cnt-fired 0";
        let mut report = stanza::parse(body);
        assert!(classify(&mut report));
        assert_eq!(report.meta("G"), Some("itdm"));
    }

    #[test]
    fn test_single_rocket_keeps_gametype() {
        let body = "G ctf\nP 1\ne acc-rg-cnt-fired 40\nP 2\ne acc-rl-cnt-fired 1";
        let mut report = stanza::parse(body);
        assert!(!classify(&mut report));
        assert_eq!(report.meta("G"), Some("ctf"));
    }

    #[test]
    fn test_empty_player_list_qualifies() {
        let mut report = stanza::parse("G ad\nI m1");
        assert!(is_instagib(&report));
        assert!(classify(&mut report));
        assert_eq!(report.meta("G"), Some("iad"));
    }
}
