//! Encounter scenarios run entirely in memory

use keeper::combat::{
    trigger_rest, trigger_time_recovery, Character, CharacterKind, Combat, Consumable,
    RecoveryType, ResetCondition, Roster,
};

fn fellowship() -> (Roster, Combat) {
    let aragorn = Character::new("Aragorn", CharacterKind::Pc).with_hp(58).with_ac(18);
    let legolas = Character::new("Legolas", CharacterKind::Pc).with_hp(45).with_ac(16);
    let orc = Character::new("Orc Chieftain", CharacterKind::Enemy)
        .with_hp(85)
        .with_ac(15);
    let lair = Character::new("Cave Collapse", CharacterKind::Lair);

    let mut combat = Combat::new();
    combat.add_character(&aragorn, 17);
    combat.add_character(&legolas, 22);
    combat.add_character(&orc, 12);
    combat.add_character(&lair, 20);

    (vec![aragorn, legolas, orc, lair].into_iter().collect(), combat)
}

#[test]
fn test_cave_ambush_walkthrough() {
    let (mut roster, mut combat) = fellowship();

    assert!(combat.start());
    assert_eq!(combat.current_round(), 1);
    assert_eq!(combat.current_turn_index(), 0);
    assert_eq!(combat.current_character(&roster).unwrap().name, "Legolas");

    let orc = roster.find_mut("Orc Chieftain").unwrap();
    orc.take_damage(25);
    assert_eq!(orc.hp().unwrap().current(), 60);
    orc.heal(100);
    assert_eq!(orc.hp().unwrap().current(), 85);

    roster.find_mut("Aragorn").unwrap().add_condition("Poisoned");

    let mut turns = Vec::new();
    for _ in 0..4 {
        combat.next_turn();
        turns.push(combat.current_character(&roster).unwrap().name.clone());
    }
    assert_eq!(turns, vec!["Cave Collapse", "Aragorn", "Orc Chieftain", "Legolas"]);
    assert_eq!(combat.current_round(), 2);

    let order = combat.initiative_order(&roster);
    assert_eq!(order[2].conditions, "Poisoned");
    assert!(order[0].is_current);
}

#[test]
fn test_lair_never_goes_down() {
    let (mut roster, mut combat) = fellowship();
    combat.start();

    let lair = roster.find_mut("Cave Collapse").unwrap();
    lair.take_damage(u32::MAX);
    assert!(!lair.is_down());
    assert_eq!(lair.hp(), None);

    let order = combat.initiative_order(&roster);
    assert!(order[1].is_active);
    assert_eq!(order[1].hp, "N/A");
}

#[test]
fn test_downed_enemy_still_takes_a_turn_slot() {
    let (mut roster, mut combat) = fellowship();
    combat.start();
    roster.find_mut("Orc Chieftain").unwrap().take_damage(200);

    for _ in 0..3 {
        combat.next_turn();
    }
    let current = combat.current_character(&roster).unwrap();
    assert_eq!(current.name, "Orc Chieftain");
    assert!(current.is_down());
    assert!(!combat.initiative_order(&roster)[3].is_active);
}

#[test]
fn test_reinforcements_mid_round_keep_turn() {
    let (mut roster, mut combat) = fellowship();
    combat.start();
    combat.next_turn();
    combat.next_turn();
    combat.next_turn();
    combat.next_turn();
    combat.next_turn();
    assert_eq!(combat.current_round(), 2);
    assert_eq!(combat.current_character(&roster).unwrap().name, "Cave Collapse");

    let goblin = Character::new("Goblin", CharacterKind::Enemy).with_hp(7);
    combat.add_character(&goblin, 21);
    roster.insert(goblin);

    assert_eq!(combat.current_character(&roster).unwrap().name, "Cave Collapse");
    let joined = combat
        .participant(roster.find("Goblin").unwrap().id())
        .unwrap()
        .joined_round;
    assert_eq!(joined, 2);

    combat.next_turn();
    combat.next_turn();
    combat.next_turn();
    assert_eq!(combat.current_round(), 3);
    assert_eq!(combat.current_character(&roster).unwrap().name, "Legolas");
    combat.next_turn();
    assert_eq!(combat.current_character(&roster).unwrap().name, "Goblin");
}

#[test]
fn test_long_day_of_adventuring() {
    let mut roster = Roster::new();
    let mut monk = Character::new("Monk", CharacterKind::Pc).with_hp(30);
    monk.add_consumable(Consumable::new("Ki", 1).resets_on(ResetCondition::ShortRest));
    monk.add_consumable(
        Consumable::new("Wholeness of Body", 1).resets_on(ResetCondition::LongRest),
    );
    roster.insert(monk);

    let mut wizard = Character::new("Wizard", CharacterKind::Pc).with_hp(20);
    wizard.add_consumable(
        Consumable::new("Wand", 7)
            .resets_on(ResetCondition::Dawn)
            .recovers(RecoveryType::Dice),
    );
    wizard.add_consumable(
        Consumable::new("Cloak", 3)
            .resets_on(ResetCondition::Dusk)
            .recovers(RecoveryType::Fixed(1)),
    );
    wizard.add_consumable(Consumable::new("Wish", 1).resets_on(ResetCondition::Never));
    roster.insert(wizard);

    let monk = roster.find_mut("Monk").unwrap();
    assert!(monk.use_consumable("Ki", 1));
    assert!(monk.use_consumable("Wholeness of Body", 1));
    let wizard = roster.find_mut("Wizard").unwrap();
    assert!(wizard.use_consumable("Wand", 6));
    assert!(wizard.use_consumable("Cloak", 3));
    assert!(wizard.use_consumable("Wish", 1));

    assert_eq!(trigger_rest(roster.iter_mut(), ResetCondition::ShortRest), 1);
    assert_eq!(trigger_time_recovery(roster.iter_mut(), ResetCondition::Dusk), 1);
    assert_eq!(trigger_rest(roster.iter_mut(), ResetCondition::LongRest), 1);
    assert_eq!(trigger_time_recovery(roster.iter_mut(), ResetCondition::Dawn), 1);
    assert_eq!(trigger_rest(roster.iter_mut(), ResetCondition::Never), 0);

    let wizard = roster.find("Wizard").unwrap();
    assert_eq!(
        wizard.consumables_display(),
        vec!["Wand (5/7)", "Cloak (1/3)", "Wish (0/1)"]
    );
    let monk = roster.find("Monk").unwrap();
    assert_eq!(monk.consumables_display(), vec!["Ki (1/1)", "Wholeness of Body (1/1)"]);
}
