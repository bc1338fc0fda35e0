use colored::Colorize;
use tcgbinder::api::{BinderPage, SearchPage};
use tcgbinder::cache::CacheEntry;
use tcgbinder::commands::{CmdMessage, MessageLevel};
use tcgbinder::config::BinderConfig;
use tcgbinder::view::PageCell;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const CELL_WIDTH: usize = 22;
const OVERFLOW_MARKER: &str = "!";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        print_message(message);
    }
}

pub(super) fn print_message(message: &CmdMessage) {
    match message.level {
        MessageLevel::Info => println!("{}", message.content.dimmed()),
        MessageLevel::Success => println!("{}", message.content.green()),
        MessageLevel::Warning => println!("{}", message.content.yellow()),
        MessageLevel::Error => println!("{}", message.content.red()),
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }
    result
}

/// Truncates or pads `s` to exactly `width` columns.
fn fit(s: &str, width: usize) -> String {
    let cut = truncate_to_width(s, width);
    let padding = width.saturating_sub(cut.width());
    format!("{}{}", cut, " ".repeat(padding))
}

fn card_label(slot_number: usize, name: &str, number: Option<&str>) -> String {
    match number {
        Some(n) => format!("{:>3} {} #{}", slot_number, name, n),
        None => format!("{:>3} {}", slot_number, name),
    }
}

fn cell_text(cell: &PageCell) -> String {
    match cell {
        PageCell::Card {
            index,
            card,
            overflow,
            ..
        } => {
            let label = fit(&card_label(index + 1, &card.name, card.number()), CELL_WIDTH);
            if *overflow {
                format!("{}", label.yellow())
            } else {
                label
            }
        }
        PageCell::Blank {
            page, slot_number, ..
        } => format!("{}", fit(&format!("{:>3} · p{}", slot_number, page), CELL_WIDTH).dimmed()),
        PageCell::Void { .. } => " ".repeat(CELL_WIDTH),
    }
}

pub(super) fn render_binder_page(page: &BinderPage) -> String {
    let layout = page.layout;
    let mut out = String::new();
    out.push_str(&format!(
        "{}  page {}/{}  ({}x{}, {} slots)\n",
        page.binder.bold(),
        page.page,
        page.page_count,
        layout.rows,
        layout.cols,
        layout.capacity()
    ));
    if !page.query.trim().is_empty() {
        out.push_str(&format!("{}\n", format!("filter: {}", page.query).dimmed()));
    }

    for row in page.cells.chunks(layout.cols.max(1)) {
        let line: Vec<String> = row.iter().map(cell_text).collect();
        out.push_str(line.join(" │ ").trim_end());
        out.push('\n');
    }

    if page
        .cells
        .iter()
        .any(|c| matches!(c, PageCell::Card { overflow: true, .. }))
    {
        out.push_str(&format!(
            "{}\n",
            format!("{} beyond binder capacity", OVERFLOW_MARKER).yellow()
        ));
    }
    out
}

pub(super) fn render_search_page(page: &SearchPage) -> String {
    let mut out = String::new();
    let title = match &page.set {
        Some(set) => format!("{} ({})", set.name, set.id.to_uppercase()),
        None => "Search results".to_string(),
    };
    out.push_str(&format!(
        "{}  page {}/{}  {} card(s)\n",
        title.bold(),
        page.page,
        page.page_count,
        page.total
    ));
    if page.cards.is_empty() {
        out.push_str("No cards found.\n");
        return out;
    }
    for row in page.cards.chunks(page.grid.cols.max(1)) {
        let line: Vec<String> = row
            .iter()
            .map(|(position, card)| fit(&card_label(position + 1, &card.name, card.number()), CELL_WIDTH))
            .collect();
        out.push_str(line.join(" │ ").trim_end());
        out.push('\n');
    }
    out
}

pub(super) fn render_binders(binders: &[String], active: &str) -> String {
    binders
        .iter()
        .map(|name| {
            if name == active {
                format!("* {}\n", name.bold())
            } else {
                format!("  {}\n", name)
            }
        })
        .collect()
}

pub(super) fn render_config(config: &BinderConfig) -> String {
    tcgbinder::config::CONFIG_KEYS
        .iter()
        .filter_map(|key| config.get(key).map(|v| format!("{} = {}\n", key, v)))
        .collect()
}

pub(super) fn render_cache_entries(entries: &[CacheEntry]) -> String {
    if entries.is_empty() {
        return "The image cache is empty.\n".to_string();
    }
    entries
        .iter()
        .map(|e| {
            format!(
                "{}  {}\n",
                e.touched.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                e.card_id
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcgbinder::layout::Layout;
    use tcgbinder::model::Card;

    fn plain() {
        colored::control::set_override(false);
    }

    fn pikachu() -> Card {
        Card::new("sv08-025", "Pikachu ex", "", "Surging Sparks", "sv08")
    }

    #[test]
    fn truncates_wide_names() {
        assert_eq!(truncate_to_width("Pikachu", 10), "Pikachu");
        assert_eq!(truncate_to_width("Charizard ex", 6), "Chari…");
        assert_eq!(fit("ab", 4), "ab  ");
    }

    #[test]
    fn binder_page_shows_cards_blanks_and_overflow() {
        plain();
        let page = BinderPage {
            binder: "Main Binder".into(),
            page: 1,
            page_count: 2,
            layout: Layout::new(1, 2, 1).unwrap(),
            query: String::new(),
            cells: vec![
                PageCell::Card {
                    position: 0,
                    index: 0,
                    card: pikachu(),
                    overflow: false,
                },
                PageCell::Blank {
                    position: 1,
                    page: 1,
                    slot_number: 2,
                },
            ],
        };
        let out = render_binder_page(&page);
        assert!(out.starts_with("Main Binder  page 1/2  (1x2, 2 slots)"));
        assert!(out.contains("1 Pikachu ex #025"));
        assert!(out.contains("2 · p1"));
        assert!(!out.contains("beyond binder capacity"));
    }

    #[test]
    fn overflow_cards_get_a_footer() {
        plain();
        let page = BinderPage {
            binder: "B".into(),
            page: 2,
            page_count: 2,
            layout: Layout::new(1, 1, 1).unwrap(),
            query: "pika".into(),
            cells: vec![PageCell::Card {
                position: 1,
                index: 1,
                card: pikachu(),
                overflow: true,
            }],
        };
        let out = render_binder_page(&page);
        assert!(out.contains("filter: pika"));
        assert!(out.contains("beyond binder capacity"));
    }

    #[test]
    fn binder_list_marks_the_open_one() {
        plain();
        let out = render_binders(&["Main Binder".into(), "Trades".into()], "Trades");
        assert_eq!(out, "  Main Binder\n* Trades\n");
    }
}
