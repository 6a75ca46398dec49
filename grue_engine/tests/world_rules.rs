use ge::*;
use grue_engine as ge;
use proptest::prelude::*;

fn world() -> (World, Transcript) {
    let transcript = Transcript::new();
    (World::new(transcript.clone()), transcript)
}

#[test]
fn test_every_thing_has_at_most_one_holder() {
    let (mut world, _) = world();
    let room = world.new_room();
    let chest = world.new_container();
    let coin = world.new_thing();
    world.add(room, chest).unwrap();
    world.add(chest, coin).unwrap();

    assert!(matches!(
        world.add(room, coin),
        Err(WorldError::AlreadyContained { child, parent }) if child == coin && parent == chest
    ));
    assert!(matches!(world.add(coin, chest), Err(WorldError::NotAHolder(_))));
    assert!(matches!(world.add(chest, room), Err(WorldError::Cycle { .. })));

    world.move_to(coin, room).unwrap();
    let holders: Vec<ThingId> = world
        .registry()
        .iter()
        .filter(|id| world.thing(*id).unwrap().raw_contents().is_some_and(|bag| bag.contains(coin)))
        .collect();
    assert_eq!(holders, vec![room]);
    assert_eq!(world.thing(coin).unwrap().parent(), Some(room));
}

#[test]
fn test_containers_cannot_swallow_their_ancestors() {
    let (mut world, _) = world();
    let outer = world.new_container();
    let inner = world.new_container();
    world.add(outer, inner).unwrap();
    assert!(matches!(world.add(inner, outer), Err(WorldError::Cycle { .. })));
    assert!(matches!(world.add(outer, outer), Err(WorldError::SelfContainment(_))));
}

#[test]
fn test_rules_are_tried_in_registration_order() {
    let (mut world, transcript) = world();
    world
        .add_rule("take :item", |world, m| {
            let text = format!("first rule took {}", m.get("item").unwrap_or_default());
            world.print(&text);
            Ok(Response::Text(text))
        })
        .unwrap();
    base_rules::install(&mut world).unwrap();
    world
        .add_rule("take :item", |_, _| panic!("a later rule must never run"))
        .unwrap();

    let evaluation = world.input("take brass lantern").unwrap();
    assert_eq!(
        evaluation,
        Evaluation::Matched(Response::Text("first rule took brass lantern".into()))
    );
    assert_eq!(transcript.lines(), vec!["first rule took brass lantern"]);
}

#[test]
fn test_route_captures_reach_the_handler() {
    let (mut world, transcript) = world();
    world
        .add_rule("put :item in :holder", |world, m| {
            let text = format!("{} -> {}", m.get("item").unwrap_or("?"), m.get("holder").unwrap_or("?"));
            world.print(&text);
            Ok(Response::Nothing)
        })
        .unwrap();
    world.input("Put the Brass Lantern in the Case").unwrap();
    assert_eq!(transcript.lines(), vec!["brass lantern -> case"]);
    assert!(world.evaluate("put lantern").unwrap().is_no_match());
}

#[test]
fn test_scope_reaches_one_level_into_holders() {
    let (mut world, _) = world();
    let room = world.new_room();
    let outer = world.new_container();
    let inner = world.new_container();
    let gem = world.new_thing();
    world.edit(outer).unwrap().set_name("crate").set_open(true);
    world.edit(inner).unwrap().set_name("casket").set_open(true);
    world.edit(gem).unwrap().set_name("gem");
    world.add(room, outer).unwrap();
    world.add(outer, inner).unwrap();
    world.add(inner, gem).unwrap();
    world.set_current_room(room).unwrap();

    let scope = world.local_scope();
    assert!(scope.contains(outer));
    assert!(scope.contains(inner));
    assert!(!scope.contains(gem));
    assert_eq!(world.find_local(None, "gem").unwrap(), None);

    world.consider_local(inner).unwrap();
    assert_eq!(world.find_local(None, "gem").unwrap(), Some(gem));
}

#[test]
fn test_selectors_narrow_local_lookups() {
    let (mut world, _) = world();
    let room = world.new_room();
    let red = world.new_thing();
    let blue = world.new_thing();
    world.edit(red).unwrap().set_name("red ball").set_portable(true);
    world.edit(blue).unwrap().set_name("blue ball").set_portable(false);
    world.add(room, red).unwrap();
    world.add(room, blue).unwrap();
    world.set_current_room(room).unwrap();

    assert_eq!(world.get_local(None, Some("ball"), true).unwrap().len(), 2);
    assert_eq!(world.get_local(None, Some("ball"), false).unwrap().len(), 1);
    assert_eq!(world.find_local(Some("portable=false"), "ball").unwrap(), Some(blue));
    assert!(world.get_local(Some("portable ! true"), None, true).is_err());
}

proptest! {
    #[test]
    fn nameless_pattern_nudges_on_any_name_fragment(
        name in "[a-z]{1,8}( [a-z]{1,8})?",
        start in 0usize..8,
        len in 1usize..8,
    ) {
        let (mut world, _) = world();
        let thing = world.new_thing();
        world.edit(thing).unwrap().set_name(name.clone());
        let start = start.min(name.len() - 1);
        let end = (start + len).min(name.len());
        let fragment = &name[start..end];
        prop_assume!(!fragment.trim().is_empty());
        prop_assert_eq!(world.thing(thing).unwrap().nudge(&fragment.to_uppercase()), Some(thing));
    }

    #[test]
    fn nudge_answers_exactly_when_the_pattern_matches(word in "[a-z]{1,3}", text in "[a-zA-Z ]{0,12}") {
        let (mut world, _) = world();
        let thing = world.new_thing();
        world.edit(thing).unwrap().set_name("widget").set_pattern(&word).unwrap();
        let expected = text.to_lowercase().contains(&word);
        prop_assert_eq!(world.thing(thing).unwrap().nudge(&text), expected.then_some(thing));
    }

    #[test]
    fn nudge_rejects_text_unrelated_to_the_thing(name in "[a-z]{1,8}( [a-z]{1,8})?", text in "[0-9]{1,6}") {
        let (mut world, _) = world();
        let plain = world.new_thing();
        let patterned = world.new_thing();
        world.edit(plain).unwrap().set_name(name.clone());
        world.edit(patterned).unwrap().set_name(name.clone()).set_pattern(&regex::escape(&name)).unwrap();
        prop_assert_eq!(world.thing(plain).unwrap().nudge(&text), None);
        prop_assert_eq!(world.thing(patterned).unwrap().nudge(&text), None);
        prop_assert_eq!(world.thing(plain).unwrap().nudge(""), None);
    }

    #[test]
    fn escaped_name_pattern_answers_like_the_name(name in "[a-z]{1,8}( [a-z]{1,8})?") {
        let (mut world, _) = world();
        let plain = world.new_thing();
        let patterned = world.new_thing();
        world.edit(plain).unwrap().set_name(name.clone());
        world.edit(patterned).unwrap().set_name(name.clone()).set_pattern(&regex::escape(&name)).unwrap();
        prop_assert!(world.thing(plain).unwrap().nudge(&name).is_some());
        prop_assert_eq!(world.thing(patterned).unwrap().nudge(&name.to_uppercase()), Some(patterned));
    }
}
