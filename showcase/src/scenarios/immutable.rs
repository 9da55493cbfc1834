use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};

use super::{Scenario, report_caught};
use crate::collections::immutable::{render_map, render_seq};
use crate::collections::{CollectionMut, ImmutableList, ImmutableMap, ImmutableSet, Unmodifiable};
use crate::config::ShowcaseConfig;
use crate::transcript::Transcript;

/// Step-by-step wrapped collections versus one-line factories
pub struct ImmutableCollections;

#[async_trait]
impl Scenario for ImmutableCollections {
    fn name(&self) -> &'static str {
        "immutable"
    }

    fn title(&self) -> &'static str {
        "Immutable collection factories"
    }

    async fn run(&self, _config: &ShowcaseConfig, out: &mut Transcript) -> anyhow::Result<()> {
        out.section("1. Legacy construction (build mutable, then wrap)");
        legacy(out);

        out.section("2. Factory construction");
        factories(out)?;

        out.section("3. Immutability and restrictions");
        restrictions(out)
    }
}

fn legacy(out: &mut Transcript) {
    let mut list = Vec::new();
    list.push("Java");
    list.push("C++");
    list.push("Python");
    let list = Unmodifiable::new(list);
    out.line(format!("List (legacy): {}", render_seq(list.iter())));

    let mut set = IndexSet::new();
    set.insert("Red");
    set.insert("Green");
    set.insert("Blue");
    let set = Unmodifiable::new(set);
    out.line(format!("Set (legacy): {}", render_seq(set.iter())));

    let mut map = IndexMap::new();
    map.insert("One", 1);
    map.insert("Two", 2);
    let map = Unmodifiable::new(map);
    out.line(format!("Map (legacy): {}", render_map(map.iter())));

    out.line("* Note: verbose, three steps for every collection");
}

fn factories(out: &mut Transcript) -> anyhow::Result<()> {
    let list = ImmutableList::of(["Java", "C++", "Python"].map(Some))?;
    out.line(format!("List (factory): {}", list));

    let set = ImmutableSet::of(["Red", "Green", "Blue"].map(Some))?;
    out.line(format!("Set (factory): {}", set));

    let map = ImmutableMap::of([(Some("One"), Some(1)), (Some("Two"), Some(2))])?;
    out.line(format!("Map (factory): {}", map));

    out.line("* Note: one expression per collection");
    Ok(())
}

fn restrictions(out: &mut Transcript) -> anyhow::Result<()> {
    let mut list = ImmutableList::of(["a", "b", "c"].map(Some))?;
    match list.add("d") {
        Err(e) => report_caught(out, "cannot add to an immutable list", e),
        Ok(_) => anyhow::bail!("immutable list accepted a new element"),
    }

    match ImmutableList::of([Some("a"), None, Some("c")]) {
        Err(e) => report_caught(out, "cannot build a list with an absent element", e),
        Ok(list) => anyhow::bail!("list with an absent element was built: {}", list),
    }

    match ImmutableSet::of(["A", "B", "A"].map(Some)) {
        Err(e) => report_caught(out, "cannot build a set with a duplicate element", e),
        Ok(set) => anyhow::bail!("set with a duplicate element was built: {}", set),
    }

    match ImmutableMap::of([(Some("Key1"), Some(1)), (Some("Key1"), Some(2))]) {
        Err(e) => report_caught(out, "cannot build a map with a duplicate key", e),
        Ok(map) => anyhow::bail!("map with a duplicate key was built: {}", map),
    }

    // The legacy wrapper refuses writes too, only later and by convention
    let mut wrapped = Unmodifiable::new(vec!["x"]);
    if let Err(e) = wrapped.add("y") {
        report_caught(out, "cannot add through an unmodifiable wrapper", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_every_restriction() {
        let mut out = Transcript::silent();
        ImmutableCollections
            .run(&ShowcaseConfig::default(), &mut out)
            .await
            .unwrap();

        assert!(out.contains("List (legacy): [Java, C++, Python]"));
        assert!(out.contains("Map (factory): {One=1, Two=2}"));
        assert!(out.contains("Caught UnsupportedOperation: cannot add to an immutable list"));
        assert!(out.contains("Caught InvalidArgument: cannot build a list with an absent element"));
        assert!(out.contains("duplicate element: \"A\""));
        assert!(out.contains("duplicate key: \"Key1\""));
    }
}
