use crate::model::{Card, Slot};
use std::fmt;

/// How much of a set the binder holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetProgress {
    pub set_name: String,
    pub owned: usize,
    pub total: usize,
}

impl fmt::Display for SetProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}/{}", self.set_name, self.owned, self.total)
    }
}

fn belongs_to(card: &Card, set_id: &str, set_name: &str) -> bool {
    if !card.set_id.is_empty() && !set_id.is_empty() {
        card.set_id == set_id
    } else {
        card.set_name == set_name
    }
}

/// Counts binder slots holding a card of the set. Copies count once each.
pub fn run(slots: &[Slot], set_id: &str, set_name: &str, total: usize) -> SetProgress {
    let owned = slots
        .iter()
        .filter_map(Slot::card)
        .filter(|card| belongs_to(card, set_id, set_name))
        .count();
    SetProgress {
        set_name: set_name.to_string(),
        owned,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::card;

    #[test]
    fn counts_cards_of_the_set() {
        let slots = vec![
            Slot::Card(card(1, "Exeggcute")),
            Slot::Empty,
            Slot::Card(Card::new("sv07-1", "Other", "", "Stellar Crown", "sv07")),
            Slot::Card(card(2, "Exeggutor")),
        ];
        let progress = run(&slots, "sv08", "Surging Sparks", 191);
        assert_eq!(progress.owned, 2);
        assert_eq!(progress.to_string(), "Surging Sparks: 2/191");
    }

    #[test]
    fn falls_back_to_set_name_for_old_records() {
        let slots = vec![Slot::Card(Card::new("x-1", "Old", "", "Surging Sparks", ""))];
        assert_eq!(run(&slots, "sv08", "Surging Sparks", 10).owned, 1);
    }
}
