use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};

use super::Scenario;
use crate::collections::immutable::{render_map, render_seq};
use crate::collections::{
    Sequenced, SequencedList, SequencedMap, SequencedMapOps, SequencedSet,
};
use crate::config::ShowcaseConfig;
use crate::transcript::Transcript;

/// Most recent customers kept on the board
const RECENT_CUSTOMERS: usize = 3;

const VISITS: [&str; 5] = ["Lan", "Nam", "Huong", "Nam", "Minh"];

/// One restaurant shift, with and without double-ended collection APIs
pub struct SequencedCollections;

#[async_trait]
impl Scenario for SequencedCollections {
    fn name(&self) -> &'static str {
        "sequenced"
    }

    fn title(&self) -> &'static str {
        "Sequenced collections"
    }

    async fn run(&self, _config: &ShowcaseConfig, out: &mut Transcript) -> anyhow::Result<()> {
        out.section("1. Legacy API (index juggling)");
        legacy(out);

        out.section("2. Sequenced API");
        sequenced(out);

        out.section("3. Summary");
        summary(out);
        Ok(())
    }
}

fn legacy(out: &mut Transcript) {
    // Menu
    let mut menu: Vec<&str> = Vec::new();
    menu.insert(0, "Special beef pho");
    menu.push("Chicken rice");
    menu.push("Bun cha");
    out.line(format!("[Legacy] Menu: {}", render_seq(&menu)));
    out.line(format!("[Legacy] First dish: {}", menu[0]));
    out.line(format!("[Legacy] Last dish: {}", menu[menu.len() - 1]));
    let mut newest_first = menu.clone();
    newest_first.reverse();
    out.line(format!(
        "[Legacy] Menu (newest first, a copy): {}",
        render_seq(&newest_first)
    ));

    // Recent customers, newest last
    let mut customers: IndexSet<&str> = IndexSet::new();
    for name in VISITS {
        customers.shift_remove(name);
        customers.insert(name);
    }
    while customers.len() > RECENT_CUSTOMERS {
        let oldest = customers.iter().next().copied();
        if let Some(oldest) = oldest {
            customers.shift_remove(oldest);
        }
    }
    let mut newest_first: Vec<&str> = customers.iter().copied().collect();
    newest_first.reverse();
    out.line(format!(
        "[Legacy] Customers (newest -> oldest): {}",
        render_seq(&newest_first)
    ));
    out.line(format!(
        "[Legacy] Customers (oldest -> newest): {}",
        render_seq(&customers)
    ));

    // Order queue; an urgent order means rebuilding the map
    let mut orders: IndexMap<&str, &str> = IndexMap::new();
    orders.insert("ORD01", "Bubble milk tea");
    orders.insert("ORD02", "Crispy chicken rice");
    let mut rebuilt = IndexMap::new();
    rebuilt.insert("ORD-URGENT", "Express beef pho");
    rebuilt.extend(orders);
    let mut orders = rebuilt;
    out.line(format!("[Legacy] Queue: {}", render_map(&orders)));

    let first_key = orders.keys().next().copied();
    if let Some(key) = first_key
        && let Some(value) = orders.shift_remove(key)
    {
        out.line(format!("[Legacy] Serve now: {}={}", key, value));
    }
    let mut last_key = None;
    for key in orders.keys() {
        last_key = Some(*key);
    }
    if let Some(key) = last_key
        && let Some(value) = orders.shift_remove(key)
    {
        out.line(format!("[Legacy] Serve later: {}={}", key, value));
    }
    out.line(format!("[Legacy] Still in the kitchen: {}", render_map(&orders)));
}

fn sequenced(out: &mut Transcript) {
    // Menu
    let mut menu = SequencedList::new();
    menu.add_first("Special beef pho");
    menu.add_last("Chicken rice");
    menu.add_last("Bun cha");
    out.line(format!("[Sequenced] Menu: {}", menu));
    if let (Some(first), Some(last)) = (menu.first(), menu.last()) {
        out.line(format!("[Sequenced] First dish: {}", first));
        out.line(format!("[Sequenced] Last dish: {}", last));
    }
    {
        let mut newest_first = menu.reversed();
        out.line(format!("[Sequenced] Menu (newest first, a view): {}", newest_first));
        newest_first.add_first("Hot banh cuon");
    }
    out.line(format!("[Sequenced] Menu after adding through the view: {}", menu));

    // Recent customers, newest first
    let mut customers = SequencedSet::new();
    for name in VISITS {
        customers.add_first(name);
    }
    while customers.len() > RECENT_CUSTOMERS {
        customers.remove_last();
    }
    out.line(format!("[Sequenced] Customers (newest -> oldest): {}", customers));
    out.line(format!(
        "[Sequenced] Customers (oldest -> newest): {}",
        customers.reversed()
    ));

    // Order queue
    let mut orders = SequencedMap::new();
    orders.put_last("ORD01", "Bubble milk tea");
    orders.put_last("ORD02", "Crispy chicken rice");
    orders.put_first("ORD-URGENT", "Express beef pho");
    out.line(format!("[Sequenced] Queue: {}", orders));

    if let Some((key, value)) = orders.poll_first_entry() {
        out.line(format!("[Sequenced] Serve now: {}={}", key, value));
    }
    if let Some((key, value)) = orders.poll_last_entry() {
        out.line(format!("[Sequenced] Serve later: {}={}", key, value));
    }
    out.line(format!("[Sequenced] Still in the kitchen: {}", orders));

    orders.reversed().put_first("ORD03", "Takeaway bun cha");
    out.line(format!("[Sequenced] Order added through the reversed view: {}", orders));
}

fn summary(out: &mut Transcript) {
    out.line("Legacy API:");
    out.line(" - Adding at either end means inserting at index 0, rebuilding a map, or remove-then-add");
    out.line(" - Reading either end means get(0), get(len - 1), or walking an iterator");
    out.line(" - Reversing means copying and reversing the copy");
    out.line("");
    out.line("Sequenced API:");
    out.line(" - add_first / add_last / first / last work on lists, sets and maps alike");
    out.line(" - remove_last / poll_first_entry / poll_last_entry treat both ends as a queue");
    out.line(" - reversed() is a live view that can also be written through");
}
