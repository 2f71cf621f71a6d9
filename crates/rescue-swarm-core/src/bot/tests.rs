use super::*;
use crate::survivor::Survivor;
use crate::zone::ZoneKind;

const ARENA: f64 = 500.0;

fn safe_arena() -> Vec<Zone> {
    vec![Zone::rectangle(
        0,
        ZoneKind::Safe,
        Point::new(0.0, 0.0),
        Point::new(ARENA, ARENA),
    )]
}

fn test_config() -> SimConfig {
    SimConfig {
        seed: 9,
        num_bots: 2,
        ..SimConfig::default()
    }
}

fn make_bot(id: BotId, x: f64, y: f64, zones: &[Zone], config: &SimConfig) -> Bot {
    Bot::new(
        id,
        Point::new(x, y),
        0,
        zones,
        Point::new(ARENA / 2.0, ARENA / 2.0),
        config,
    )
}

fn ctx<'a>(
    zones: &'a [Zone],
    survivors: &'a [Survivor],
    config: &'a SimConfig,
    tick: u64,
) -> TickContext<'a> {
    TickContext {
        zones,
        survivors,
        arena: Rect::new(Point::new(0.0, 0.0), Point::new(ARENA, ARENA)),
        tick,
        config,
    }
}

fn claim_message(from: &Bot, zones: &[Zone], location: Point, claim_tick: u64) -> Message {
    Message {
        sender: from.info(zones),
        body: MessageBody::Claim {
            claimer: from.id,
            tick: claim_tick,
            location,
            claim_tick,
        },
    }
}

#[test]
fn phase_codes_round_trip_and_fail_safe() {
    for phase in [
        BotPhase::WaitingToTurnOn,
        BotPhase::SpreadOut,
        BotPhase::CreatePaths,
        BotPhase::Aggregate,
    ] {
        assert_eq!(BotPhase::from_code(phase.code()), phase);
    }
    assert_eq!(BotPhase::from_code(200), BotPhase::WaitingToTurnOn);
}

#[test]
fn waiting_bot_drops_inbox_and_eventually_activates() {
    let zones = safe_arena();
    let config = SimConfig {
        activation_probability: 1.0,
        ..test_config()
    };
    let survivors = [];
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    bot.deliver(claim_message(
        &make_bot(1, 50.0, 50.0, &zones, &config),
        &zones,
        Point::new(10.0, 10.0),
        1,
    ));
    bot.begin_tick();

    let mut out = Vec::new();
    let c = ctx(&zones, &survivors, &config, 1);
    bot.step(&c, &mut out).unwrap();

    assert_eq!(bot.phase, BotPhase::SpreadOut);
    assert!(bot.inbox.is_empty());
    assert!(bot.claimed_survivors.is_empty(), "queued claim must be dropped unread");
    assert!(out.is_empty());
}

#[test]
fn duplicate_broadcast_is_suppressed_within_a_tick() {
    let zones = safe_arena();
    let config = test_config();
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    let body = MessageBody::Found {
        finder: 0,
        tick: 1,
        damage: 0.5,
        location: Point::new(1.0, 1.0),
    };

    let mut out = Vec::new();
    bot.broadcast(body.clone(), &zones, &mut out);
    bot.broadcast(body.clone(), &zones, &mut out);
    assert_eq!(out.len(), 1);

    // The dedup window is one tick wide: the same body may go out again
    // after the next tick opens.
    bot.begin_tick();
    bot.broadcast(body, &zones, &mut out);
    assert_eq!(out.len(), 2);
}

#[test]
fn claim_tie_at_equal_tick_resolves_to_lower_id_both_orderings() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let location = Point::new(105.0, 100.0);

    // Ordering 1: the lower-id bot receives the higher-id bot's claim.
    let mut low = make_bot(0, 100.0, 100.0, &zones, &config);
    let high = make_bot(1, 110.0, 100.0, &zones, &config);
    low.my_survivor = Some(Survivor::new(location, 0.5));
    low.my_claim_tick = 5;
    low.deliver(claim_message(&high, &zones, location, 5));
    low.begin_tick();
    let mut out = Vec::new();
    low.read_messages(&ctx(&zones, &survivors, &config, 6), &mut out)
        .unwrap();
    assert!(low.my_survivor.is_some(), "lower id keeps the claim");
    assert!(
        out.iter()
            .any(|m| matches!(m.body, MessageBody::Claim { claimer: 0, .. })),
        "winner reasserts its own claim"
    );

    // Ordering 2: the higher-id bot receives the lower-id bot's claim.
    let low = make_bot(0, 100.0, 100.0, &zones, &config);
    let mut high = make_bot(1, 110.0, 100.0, &zones, &config);
    high.my_survivor = Some(Survivor::new(location, 0.5));
    high.my_claim_tick = 5;
    high.deliver(claim_message(&low, &zones, location, 5));
    high.begin_tick();
    let mut out = Vec::new();
    high.read_messages(&ctx(&zones, &survivors, &config, 6), &mut out)
        .unwrap();
    assert!(high.my_survivor.is_none(), "higher id yields the claim");
    assert!(
        out.iter()
            .any(|m| matches!(m.body, MessageBody::Claim { claimer: 0, .. })),
        "loser relays the winning claim"
    );
    assert_eq!(high.claimed_survivors.len(), 1);
}

#[test]
fn strictly_earlier_claim_wins() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let location = Point::new(105.0, 100.0);

    let mut late = make_bot(0, 100.0, 100.0, &zones, &config);
    let early = make_bot(1, 110.0, 100.0, &zones, &config);
    late.my_survivor = Some(Survivor::new(location, 0.5));
    late.my_claim_tick = 8;
    late.deliver(claim_message(&early, &zones, location, 3));
    late.begin_tick();
    let mut out = Vec::new();
    late.read_messages(&ctx(&zones, &survivors, &config, 9), &mut out)
        .unwrap();
    assert!(late.my_survivor.is_none(), "earlier claim takes precedence over id order");
}

#[test]
fn claim_for_other_survivor_merges_and_floods() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];

    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    let other = make_bot(1, 110.0, 100.0, &zones, &config);
    bot.my_survivor = Some(Survivor::new(Point::new(10.0, 10.0), 0.5));
    bot.my_claim_tick = 2;
    bot.deliver(claim_message(&other, &zones, Point::new(300.0, 300.0), 4));
    bot.begin_tick();
    let mut out = Vec::new();
    bot.read_messages(&ctx(&zones, &survivors, &config, 5), &mut out)
        .unwrap();
    assert!(bot.my_survivor.is_some());
    assert_eq!(bot.claimed_survivors.len(), 1);
    assert_eq!(out.len(), 1, "foreign claims keep flooding");
}

#[test]
fn stale_messages_are_silently_dropped() {
    let zones = safe_arena();
    let config = SimConfig {
        message_timeout: Some(2),
        ..test_config()
    };
    let survivors = [];
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    let sender = make_bot(1, 110.0, 100.0, &zones, &config);
    bot.deliver(Message {
        sender: sender.info(&zones),
        body: MessageBody::Found {
            finder: 1,
            tick: 1,
            damage: 0.5,
            location: Point::new(50.0, 50.0),
        },
    });
    bot.begin_tick();
    let mut out = Vec::new();
    bot.read_messages(&ctx(&zones, &survivors, &config, 10), &mut out)
        .unwrap();
    assert!(bot.known_survivors.is_empty());
    assert!(out.is_empty());
}

#[test]
fn settles_only_after_a_full_window_of_holding_still() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);

    for i in 0..config.settle_window {
        assert!(!bot.settled, "must not settle before the window fills (step {i})");
        bot.update_settlement(&ctx(&zones, &survivors, &config, i as u64));
    }
    bot.update_settlement(&ctx(&zones, &survivors, &config, 200));
    assert!(bot.settled);
}

#[test]
fn oscillating_bot_never_settles() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);

    // Amplitude 10 around the mean, well above the settle threshold of
    // max_velocity / 2 = 4.
    for i in 0..(config.settle_window * 3) {
        bot.center = Point::new(if i % 2 == 0 { 100.0 } else { 110.0 }, 100.0);
        bot.update_settlement(&ctx(&zones, &survivors, &config, i as u64));
        assert!(!bot.settled);
    }
}

#[test]
fn claimed_survivor_pursuit_overrides_visible_survivors() {
    let zones = safe_arena();
    let config = test_config();
    let visible = [Survivor::new(Point::new(101.0, 100.0), 0.9)];
    let claimed_location = Point::new(200.0, 200.0);

    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    bot.my_survivor = Some(Survivor::new(claimed_location, 0.5));
    let v = bot
        .select_movement_vector(&ctx(&zones, &visible, &config, 1))
        .unwrap();
    assert!(v.end().approx_eq(claimed_location));
}

#[test]
fn settled_bot_without_neighbors_returns_to_base() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    bot.settled = true;
    let v = bot
        .select_movement_vector(&ctx(&zones, &survivors, &config, 1))
        .unwrap();
    assert!(v.end().approx_eq(bot.base_center));

    bot.neighbors.push(BotInfo::new(1, Point::new(120.0, 100.0), 1.0));
    let v = bot
        .select_movement_vector(&ctx(&zones, &survivors, &config, 2))
        .unwrap();
    assert!(v.is_zero(), "settled bot with radio contact holds position");
}

#[test]
fn boundary_containment_under_repeated_outward_pushes() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let arena = Rect::new(Point::new(0.0, 0.0), Point::new(ARENA, ARENA));
    let mut bot = make_bot(0, 495.0, 250.0, &zones, &config);

    for i in 0..50 {
        let outward = Vector::new(bot.center, Point::new(bot.center.x + 40.0, bot.center.y + 7.0));
        bot.travel_along(outward, &ctx(&zones, &survivors, &config, i))
            .unwrap();
        assert!(
            arena.contains_point(bot.center),
            "bot escaped the arena at {:?}",
            bot.center
        );
    }
}

#[test]
fn misaligned_movement_vector_is_corrected_not_fatal() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    let misaligned = Vector::new(Point::new(0.0, 0.0), Point::new(4.0, 0.0));
    bot.travel_along(misaligned, &ctx(&zones, &survivors, &config, 1))
        .unwrap();
    assert!(bot.center.approx_eq(Point::new(104.0, 100.0)));
}

#[test]
fn repulsion_zone_produces_force_and_inert_zone_does_not() {
    let config = test_config();
    let survivors = [];

    let repelling = vec![
        Zone::rectangle(0, ZoneKind::Safe, Point::new(0.0, 0.0), Point::new(ARENA, ARENA)),
        Zone::rectangle(1, ZoneKind::Fire, Point::new(120.0, 80.0), Point::new(180.0, 120.0)),
    ];
    let bot = make_bot(0, 118.0, 100.0, &repelling, &config);
    let force = bot
        .zone_repulsion_force(&ctx(&repelling, &survivors, &config, 1))
        .unwrap();
    assert!(force.magnitude() > 0.0);
    // The force points away from the zone edge at x = 120.
    assert!(force.dx() < 0.0);

    let inert = vec![
        Zone::rectangle(0, ZoneKind::Safe, Point::new(0.0, 0.0), Point::new(ARENA, ARENA)),
        Zone::rectangle(1, ZoneKind::Danger, Point::new(120.0, 80.0), Point::new(180.0, 120.0)),
    ];
    let bot = make_bot(0, 118.0, 100.0, &inert, &config);
    let force = bot
        .zone_repulsion_force(&ctx(&inert, &survivors, &config, 1))
        .unwrap();
    assert_eq!(force.magnitude(), 0.0);
}

#[test]
fn repulsion_flips_outward_when_inside_the_zone() {
    let config = test_config();
    let survivors = [];
    let zones = vec![
        Zone::rectangle(0, ZoneKind::Safe, Point::new(0.0, 0.0), Point::new(ARENA, ARENA)),
        Zone::rectangle(1, ZoneKind::Fire, Point::new(120.0, 80.0), Point::new(180.0, 120.0)),
    ];
    // Standing just inside the left edge of the fire zone.
    let mut bot = make_bot(0, 122.0, 100.0, &zones, &config);
    bot.current_zone = 1;
    let force = bot
        .zone_repulsion_force(&ctx(&zones, &survivors, &config, 1))
        .unwrap();
    assert!(force.magnitude() > 0.0);
    assert!(force.dx() < 0.0, "force must push back out across the near edge");
}

#[test]
fn election_fails_on_objection_and_backs_off_then_succeeds() {
    let zones = safe_arena();
    let config = SimConfig {
        num_bots: 2,
        election_timeout_factor: 2,
        ..test_config()
    };
    let survivors = [];
    let timeout = config.election_timeout_ticks();
    assert_eq!(timeout, 4);

    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    bot.phase = BotPhase::SpreadOut;
    bot.settled = true;

    // Start an election at tick 10.
    let mut out = Vec::new();
    bot.run_election_round(&ctx(&zones, &survivors, &config, 10), &mut out);
    assert!(bot.current_election.is_some());
    assert!(matches!(
        out[0].body,
        MessageBody::ElectionStart { starter: 0, number: 1, .. }
    ));

    // An objection tagged with our number fails it.
    let peer = make_bot(1, 110.0, 100.0, &zones, &config);
    bot.deliver(Message {
        sender: peer.info(&zones),
        body: MessageBody::NotReady {
            starter: 0,
            tick: 11,
            number: 1,
        },
    });
    bot.begin_tick();
    let mut out = Vec::new();
    bot.read_messages(&ctx(&zones, &survivors, &config, 12), &mut out)
        .unwrap();
    assert!(bot.current_election.is_none());
    assert_eq!(
        bot.last_election_seen_tick,
        Some(10),
        "retry window is backdated to the start tick"
    );

    // Back-off: not eligible again before start + timeout.
    let mut out = Vec::new();
    bot.run_election_round(&ctx(&zones, &survivors, &config, 13), &mut out);
    assert!(bot.current_election.is_none());

    // Eligible again at tick 14; this time nobody objects.
    let mut out = Vec::new();
    bot.run_election_round(&ctx(&zones, &survivors, &config, 14), &mut out);
    assert!(matches!(
        out[0].body,
        MessageBody::ElectionStart { number: 2, .. }
    ));
    let mut out = Vec::new();
    bot.run_election_round(&ctx(&zones, &survivors, &config, 18), &mut out);
    assert!(
        out.iter()
            .any(|m| matches!(m.body, MessageBody::Advance { number: 2, .. })),
        "surviving the timeout broadcasts the advance"
    );
    assert_eq!(bot.phase, BotPhase::CreatePaths);
}

#[test]
fn unsettled_recipient_objects_instead_of_endorsing() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    bot.phase = BotPhase::SpreadOut;
    let starter = make_bot(1, 110.0, 100.0, &zones, &config);

    let election = Message {
        sender: starter.info(&zones),
        body: MessageBody::ElectionStart {
            starter: 1,
            tick: 20,
            number: 3,
        },
    };
    bot.deliver(election.clone());
    bot.begin_tick();
    let mut out = Vec::new();
    bot.read_messages(&ctx(&zones, &survivors, &config, 21), &mut out)
        .unwrap();
    assert_eq!(out.len(), 1);
    assert!(matches!(
        out[0].body,
        MessageBody::NotReady { starter: 1, number: 3, .. }
    ));

    // A settled recipient endorses by relaying, but only for numbers above
    // the highest already seen from that starter.
    let mut settled = make_bot(2, 120.0, 100.0, &zones, &config);
    settled.phase = BotPhase::SpreadOut;
    settled.settled = true;
    settled.deliver(election.clone());
    settled.deliver(election);
    settled.begin_tick();
    let mut out = Vec::new();
    settled
        .read_messages(&ctx(&zones, &survivors, &config, 21), &mut out)
        .unwrap();
    assert_eq!(out.len(), 1, "stale echo is dropped, endorsement relayed once");
    assert!(matches!(out[0].body, MessageBody::ElectionStart { .. }));
}

#[test]
fn advance_adopts_phase_and_seeds_path_for_claim_holder() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    bot.phase = BotPhase::SpreadOut;
    bot.my_survivor = Some(Survivor::new(Point::new(90.0, 90.0), 0.7));
    bot.my_claim_tick = 30;

    let starter = make_bot(1, 110.0, 100.0, &zones, &config);
    bot.deliver(Message {
        sender: starter.info(&zones),
        body: MessageBody::Advance {
            starter: 1,
            tick: 40,
            number: 2,
        },
    });
    bot.begin_tick();
    let mut out = Vec::new();
    bot.read_messages(&ctx(&zones, &survivors, &config, 41), &mut out)
        .unwrap();

    assert_eq!(bot.phase, BotPhase::CreatePaths);
    assert!(bot.path_started);
    assert!(out.iter().any(|m| matches!(m.body, MessageBody::Advance { .. })));
    let seeded = out
        .iter()
        .find_map(|m| match &m.body {
            MessageBody::PathCandidate { path, .. } => Some(path),
            _ => None,
        })
        .expect("claim holder seeds its survivor path");
    assert_eq!(seeded.waypoints().len(), 1);
    assert!(seeded.end().approx_eq(bot.base_center));
    assert!(!seeded.is_complete());
}

#[test]
fn path_relaxation_keeps_the_shorter_candidate_in_both_orders() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let survivor = Survivor::new(Point::new(50.0, 50.0), 0.6);
    let claimer = BotInfo::new(5, Point::new(50.0, 50.0), 1.0);
    let end = Point::new(250.0, 250.0);

    // A direct seed and a detoured, heavier alternative.
    let short = SurvivorPath::new(claimer, survivor, end, 100);
    let mut long = SurvivorPath::new(claimer, survivor, end, 100);
    long.push_waypoint(BotInfo::new(6, Point::new(50.0, 400.0), 2.5))
        .unwrap();
    assert!(long.length() > short.length());

    for candidates in [[short.clone(), long.clone()], [long, short]] {
        let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
        bot.phase = BotPhase::CreatePaths;
        let sender = make_bot(1, 110.0, 100.0, &zones, &config);
        let mut expected_lengths = Vec::new();
        for candidate in candidates {
            let mut extended = candidate.clone();
            extended.push_waypoint(bot.info(&zones)).unwrap();
            expected_lengths.push(extended.length());
            bot.deliver(Message {
                sender: sender.info(&zones),
                body: MessageBody::PathCandidate {
                    tick: 101,
                    path: candidate,
                },
            });
        }
        bot.begin_tick();
        let mut out = Vec::new();
        bot.read_messages(&ctx(&zones, &survivors, &config, 102), &mut out)
            .unwrap();

        assert_eq!(bot.best_paths.len(), 1);
        let stored = bot.best_paths[0].length();
        let best_expected = expected_lengths
            .iter()
            .cloned()
            .fold(f64::MAX, f64::min);
        for candidate_length in &expected_lengths {
            assert!(stored <= *candidate_length);
        }
        assert!((stored - best_expected).abs() < 1e-9);
    }
}

#[test]
fn found_reports_merge_and_flood() {
    let zones = safe_arena();
    let config = test_config();
    let survivors = [];
    let mut bot = make_bot(0, 100.0, 100.0, &zones, &config);
    let finder = make_bot(1, 110.0, 100.0, &zones, &config);
    let location = Point::new(77.0, 77.0);

    for (tick, damage) in [(3u64, 0.3), (4u64, 0.8)] {
        bot.deliver(Message {
            sender: finder.info(&zones),
            body: MessageBody::Found {
                finder: 1,
                tick,
                damage,
                location,
            },
        });
    }
    bot.begin_tick();
    let mut out = Vec::new();
    bot.read_messages(&ctx(&zones, &survivors, &config, 5), &mut out)
        .unwrap();

    assert_eq!(bot.known_survivors.len(), 1);
    assert!((bot.known_survivors[0].damage - 0.8).abs() < 1e-12);
    assert_eq!(out.len(), 2, "both distinct reports keep flooding");
}
