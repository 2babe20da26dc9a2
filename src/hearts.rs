//! Floating heart layer: ambient risers, point bursts, and the recurring
//! celebration loop.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::Rng;

use crate::settings::Settings;

pub const HEART_GLYPHS: [&str; 6] = [
    "\u{1F496}",
    "\u{1F495}",
    "\u{1F497}",
    "\u{1F493}",
    "\u{1F49E}",
    "\u{1F498}",
];

pub const DEFAULT_BURST_COUNT: u32 = 30;
const BURST_STAGGER_SECS: f32 = 0.05;
const BURST_LIFETIME_SECS: f32 = 3.0;
const BURST_TRAVEL_SECS: f32 = 1.0;
const BURST_DIST_MIN: f32 = 100.0;
const BURST_DIST_MAX: f32 = 400.0;
const LOOP_SECONDARY_OFFSETS: [f32; 2] = [0.5, 1.0];
const LOOP_SECONDARY_COUNT: u32 = 20;
const LOOP_REPEAT_COUNT: u32 = 15;
// Risers enter below the viewport and leave above it.
const RISER_MARGIN: f32 = 60.0;
const RISER_WOBBLE: f32 = 18.0;
const Z_RISERS: f32 = -5.0;
const Z_BURSTS: f32 = 15.0;

#[derive(Component)]
pub struct FloatingHeart {
    vel: Vec2,
    delay: f32,
    lifetime: f32,
    phase: f32,
    spin: f32,
}

#[derive(Component)]
pub struct BurstHeart {
    vel: Vec2,
    lifetime: f32,
}

#[derive(Event)]
pub struct StartHearts;

#[derive(Event)]
pub struct StopHearts;

#[derive(Event)]
pub struct HeartBurst {
    pub center: Vec2,
    pub count: u32,
}

impl HeartBurst {
    pub fn centered(count: u32) -> Self {
        Self {
            center: Vec2::ZERO,
            count,
        }
    }
}

#[derive(Event)]
pub struct StartHeartLoop {
    pub interval: f32,
}

#[derive(Event)]
pub struct StopHeartLoop;

struct PendingBurst {
    center: Vec2,
    left: u32,
    wait: f32,
}

struct DelayedBurst {
    wait: f32,
    count: u32,
}

struct LoopTick {
    interval: f32,
    wait: f32,
}

/// All emitter bookkeeping. The recurring spawn owns a single countdown slot,
/// so starting twice rearms the cadence instead of stacking a second one.
#[derive(Resource, Default)]
pub struct HeartEmitter {
    spawn_wait: Option<f32>,
    batch_left: u32,
    batch_wait: f32,
    bursts: Vec<PendingBurst>,
    delayed: Vec<DelayedBurst>,
    loop_tick: Option<LoopTick>,
}

pub struct HeartsPlugin;

impl Plugin for HeartsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Settings>()
            .init_resource::<HeartEmitter>()
            .add_event::<StartHearts>()
            .add_event::<StopHearts>()
            .add_event::<HeartBurst>()
            .add_event::<StartHeartLoop>()
            .add_event::<StopHeartLoop>()
            .add_systems(
                Update,
                (
                    control_emitter,
                    control_loop,
                    queue_bursts,
                    tick_emitter,
                    tick_bursts,
                    animate_risers,
                    animate_burst_hearts,
                    reap_hearts,
                ),
            );
    }
}

fn control_emitter(
    settings: Res<Settings>,
    mut emitter: ResMut<HeartEmitter>,
    mut starts: EventReader<StartHearts>,
    mut stops: EventReader<StopHearts>,
) {
    if !starts.is_empty() {
        starts.clear();
        emitter.spawn_wait = Some(settings.spawn_secs);
        emitter.batch_left = settings.batch_count;
        emitter.batch_wait = 0.0;
    }
    // Stopping cancels the recurring spawn only; an in-progress opening batch
    // and airborne hearts finish on their own.
    if !stops.is_empty() {
        stops.clear();
        emitter.spawn_wait = None;
    }
}

fn control_loop(
    mut emitter: ResMut<HeartEmitter>,
    mut starts: EventReader<StartHeartLoop>,
    mut stops: EventReader<StopHeartLoop>,
    mut bursts: EventWriter<HeartBurst>,
) {
    for ev in starts.read() {
        bursts.send(HeartBurst::centered(DEFAULT_BURST_COUNT));
        for offset in LOOP_SECONDARY_OFFSETS {
            emitter.delayed.push(DelayedBurst {
                wait: offset,
                count: LOOP_SECONDARY_COUNT,
            });
        }
        emitter.loop_tick = Some(LoopTick {
            interval: ev.interval.max(0.1),
            wait: ev.interval.max(0.1),
        });
    }
    // Cancels the repeat only; already-queued follow-up bursts still fire.
    if !stops.is_empty() {
        stops.clear();
        emitter.loop_tick = None;
    }
}

fn queue_bursts(mut emitter: ResMut<HeartEmitter>, mut requests: EventReader<HeartBurst>) {
    for ev in requests.read() {
        emitter.bursts.push(PendingBurst {
            center: ev.center,
            left: ev.count,
            wait: 0.0,
        });
    }
}

fn tick_emitter(
    time: Res<Time>,
    settings: Res<Settings>,
    mut emitter: ResMut<HeartEmitter>,
    windows: Query<&Window, With<PrimaryWindow>>,
    live: Query<(), With<FloatingHeart>>,
    mut cmd: Commands,
) {
    if emitter.spawn_wait.is_none() && emitter.batch_left == 0 {
        return;
    }
    let Ok(win) = windows.get_single() else {
        warn_once!("hearts: no primary window, emitter idle");
        return;
    };
    let (w, h) = (win.width(), win.height());
    let dt = time.delta_secs();
    let mut rng = rand::rng();
    let mut alive = live.iter().count();

    if emitter.batch_left > 0 {
        let stagger = settings.batch_secs.max(0.01);
        emitter.batch_wait -= dt;
        while emitter.batch_wait <= 0.0 && emitter.batch_left > 0 {
            emitter.batch_left -= 1;
            emitter.batch_wait += stagger;
            if alive < settings.max_hearts {
                spawn_riser(&mut cmd, &mut rng, &settings, w, h);
                alive += 1;
            }
        }
    }

    let cadence = settings.spawn_secs.max(0.01);
    let max_hearts = settings.max_hearts;
    if let Some(wait) = emitter.spawn_wait.as_mut() {
        *wait -= dt;
        while *wait <= 0.0 {
            *wait += cadence;
            if alive < max_hearts {
                spawn_riser(&mut cmd, &mut rng, &settings, w, h);
                alive += 1;
            }
        }
    }
}

fn tick_bursts(
    time: Res<Time>,
    mut emitter: ResMut<HeartEmitter>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cmd: Commands,
) {
    let dt = time.delta_secs();
    let mut rng = rand::rng();
    let view = windows
        .get_single()
        .map(|w| Vec2::new(w.width(), w.height()))
        .ok();

    let mut fired: Vec<(Vec2, u32)> = Vec::new();
    for d in emitter.delayed.iter_mut() {
        d.wait -= dt;
        if d.wait <= 0.0 {
            fired.push((random_point(&mut rng, view), d.count));
        }
    }
    emitter.delayed.retain(|d| d.wait > 0.0);

    if let Some(tick) = emitter.loop_tick.as_mut() {
        tick.wait -= dt;
        if tick.wait <= 0.0 {
            tick.wait += tick.interval;
            fired.push((random_point(&mut rng, view), LOOP_REPEAT_COUNT));
        }
    }
    for (center, count) in fired {
        emitter.bursts.push(PendingBurst {
            center,
            left: count,
            wait: 0.0,
        });
    }

    for burst in emitter.bursts.iter_mut() {
        burst.wait -= dt;
        while burst.wait <= 0.0 && burst.left > 0 {
            burst.left -= 1;
            burst.wait += BURST_STAGGER_SECS;
            spawn_burst_heart(&mut cmd, &mut rng, burst.center);
        }
    }
    emitter.bursts.retain(|b| b.left > 0);
}

fn spawn_riser(cmd: &mut Commands, rng: &mut impl Rng, settings: &Settings, w: f32, h: f32) {
    let glyph = HEART_GLYPHS[rng.random_range(0..HEART_GLYPHS.len())];
    let duration = rng.random_range(settings.rise_secs_min..settings.rise_secs_max);
    let delay = rng.random_range(0.0..settings.rise_delay_max.max(0.01));
    let climb = h + 2.0 * RISER_MARGIN;
    cmd.spawn((
        Text2d::new(glyph),
        TextFont {
            font_size: rng.random_range(settings.heart_size_min..settings.heart_size_max),
            ..default()
        },
        Transform::from_xyz(
            rng.random_range(-w / 2.0..w / 2.0),
            -h / 2.0 - RISER_MARGIN,
            Z_RISERS,
        ),
        FloatingHeart {
            vel: Vec2::new(rng.random_range(-10.0..10.0), climb / duration),
            delay,
            lifetime: duration + delay,
            phase: rng.random_range(0.0..std::f32::consts::TAU),
            spin: rng.random_range(-0.5..0.5),
        },
    ));
}

fn spawn_burst_heart(cmd: &mut Commands, rng: &mut impl Rng, center: Vec2) {
    let glyph = HEART_GLYPHS[rng.random_range(0..HEART_GLYPHS.len())];
    cmd.spawn((
        Text2d::new(glyph),
        TextFont {
            font_size: rng.random_range(20.0..36.0),
            ..default()
        },
        Transform::from_translation(center.extend(Z_BURSTS)),
        BurstHeart {
            vel: burst_velocity(rng),
            lifetime: BURST_LIFETIME_SECS,
        },
    ));
}

/// Uniform direction, random radial distance, spent over the travel window.
pub fn burst_velocity(rng: &mut impl Rng) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    let dist = rng.random_range(BURST_DIST_MIN..BURST_DIST_MAX);
    Vec2::new(angle.cos(), angle.sin()) * (dist / BURST_TRAVEL_SECS)
}

fn random_point(rng: &mut impl Rng, view: Option<Vec2>) -> Vec2 {
    match view {
        Some(v) if v.x > 1.0 && v.y > 1.0 => Vec2::new(
            rng.random_range(-v.x / 2.0..v.x / 2.0),
            rng.random_range(-v.y / 2.0..v.y / 2.0),
        ),
        _ => Vec2::ZERO,
    }
}

fn animate_risers(time: Res<Time>, mut hearts: Query<(&mut Transform, &mut FloatingHeart)>) {
    let dt = time.delta_secs();
    let now = time.elapsed_secs();
    for (mut t, mut h) in hearts.iter_mut() {
        if h.delay > 0.0 {
            h.delay -= dt;
            continue;
        }
        t.translation.y += h.vel.y * dt;
        t.translation.x += (h.vel.x + (now * 1.5 + h.phase).sin() * RISER_WOBBLE) * dt;
        t.rotation = Quat::from_rotation_z(now * h.spin + h.phase);
    }
}

fn animate_burst_hearts(time: Res<Time>, mut hearts: Query<(&mut Transform, &BurstHeart)>) {
    let dt = time.delta_secs();
    for (mut t, b) in hearts.iter_mut() {
        // Displacement is spent in the travel window; the heart then hangs
        // and shrinks out for the rest of its lifetime.
        if b.lifetime > BURST_LIFETIME_SECS - BURST_TRAVEL_SECS {
            t.translation.x += b.vel.x * dt;
            t.translation.y += b.vel.y * dt;
        }
        let k = (b.lifetime / BURST_LIFETIME_SECS).clamp(0.0, 1.0);
        t.scale = Vec3::splat(k.max(0.2));
    }
}

fn reap_hearts(
    time: Res<Time>,
    mut cmd: Commands,
    mut risers: Query<(Entity, &mut FloatingHeart)>,
    mut bursts: Query<(Entity, &mut BurstHeart)>,
) {
    let dt = time.delta_secs();
    for (e, mut h) in risers.iter_mut() {
        h.lifetime -= dt;
        if h.lifetime <= 0.0 {
            if let Some(mut ec) = cmd.get_entity(e) {
                ec.despawn();
            }
        }
    }
    for (e, mut b) in bursts.iter_mut() {
        b.lifetime -= dt;
        if b.lifetime <= 0.0 {
            if let Some(mut ec) = cmd.get_entity(e) {
                ec.despawn();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::time::TimeUpdateStrategy;
    use bevy::window::PrimaryWindow;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn test_app(settings: Settings) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            100,
        )));
        app.insert_resource(settings);
        app.add_plugins(HeartsPlugin);
        app.world_mut().spawn((Window::default(), PrimaryWindow));
        app
    }

    #[test]
    fn burst_distance_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(20260805);
        for _ in 0..500 {
            let dist = (burst_velocity(&mut rng) * BURST_TRAVEL_SECS).length();
            assert!(
                (BURST_DIST_MIN - 0.5..=BURST_DIST_MAX + 0.5).contains(&dist),
                "distance {dist} out of range"
            );
        }
    }

    #[test]
    fn live_riser_count_never_exceeds_ceiling() {
        let settings = Settings {
            spawn_secs: 0.05,
            batch_count: 8,
            batch_secs: 0.05,
            max_hearts: 10,
            rise_secs_min: 30.0,
            rise_secs_max: 40.0,
            ..Settings::default()
        };
        let max = settings.max_hearts;
        let mut app = test_app(settings);
        app.world_mut().send_event(StartHearts);
        for _ in 0..100 {
            app.update();
            let live = app
                .world_mut()
                .query_filtered::<(), With<FloatingHeart>>()
                .iter(app.world())
                .count();
            assert!(live <= max, "live {live} exceeds ceiling {max}");
        }
        // with long lifetimes the emitter must be pinned at the ceiling by now
        let live = app
            .world_mut()
            .query_filtered::<(), With<FloatingHeart>>()
            .iter(app.world())
            .count();
        assert_eq!(live, max);
    }

    #[test]
    fn stop_twice_is_a_no_op() {
        let mut app = test_app(Settings::default());
        app.world_mut().send_event(StartHearts);
        app.update();
        assert!(app.world().resource::<HeartEmitter>().spawn_wait.is_some());
        app.world_mut().send_event(StopHearts);
        app.update();
        app.world_mut().send_event(StopHearts);
        app.update();
        assert!(app.world().resource::<HeartEmitter>().spawn_wait.is_none());
    }

    #[test]
    fn restart_rearms_a_single_cadence() {
        let mut app = test_app(Settings::default());
        app.world_mut().send_event(StartHearts);
        app.update();
        app.world_mut().send_event(StartHearts);
        app.update();
        let emitter = app.world().resource::<HeartEmitter>();
        assert!(emitter.spawn_wait.is_some());
        app.world_mut().send_event(StopHearts);
        app.update();
        assert!(app.world().resource::<HeartEmitter>().spawn_wait.is_none());
    }

    #[test]
    fn burst_spawns_requested_count_over_stagger() {
        let mut app = test_app(Settings::default());
        app.world_mut().send_event(HeartBurst::centered(12));
        // 12 hearts at 50 ms stagger fit inside a second of stepping
        for _ in 0..12 {
            app.update();
        }
        let live = app
            .world_mut()
            .query_filtered::<(), With<BurstHeart>>()
            .iter(app.world())
            .count();
        assert_eq!(live, 12);
    }

    #[test]
    fn burst_hearts_expire_after_lifetime() {
        let mut app = test_app(Settings::default());
        app.world_mut().send_event(HeartBurst::centered(5));
        // lifetime 3 s + stagger, stepped at 100 ms
        for _ in 0..45 {
            app.update();
        }
        let live = app
            .world_mut()
            .query_filtered::<(), With<BurstHeart>>()
            .iter(app.world())
            .count();
        assert_eq!(live, 0);
    }

    #[test]
    fn stopping_loop_keeps_queued_followups() {
        let mut app = test_app(Settings::default());
        app.world_mut().send_event(StartHeartLoop { interval: 2.0 });
        app.update();
        app.world_mut().send_event(StopHeartLoop);
        app.update();
        let emitter = app.world().resource::<HeartEmitter>();
        assert!(emitter.loop_tick.is_none());
        assert!(
            !emitter.delayed.is_empty(),
            "follow-up bursts must survive loop cancellation"
        );
    }
}
