//! Screen transition from the question to the celebration, plus the cursor
//! sparkle trail that runs once the celebration is live.

use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow};
use rand::Rng;

use crate::hearts::{HeartBurst, StartHeartLoop};
use crate::runaway::YesButton;
use crate::settings::Settings;

pub const SPARKLE_GLYPHS: [&str; 4] = ["\u{2728}", "\u{1F496}", "\u{2B50}", "\u{1F4AB}"];

const HIDE_SECS: f32 = 0.4;
const CELEBRATION_BURST_COUNT: u32 = 50;
const SPARKLE_LIFETIME_SECS: f32 = 0.8;
const SPARKLE_JITTER: f32 = 15.0;
// Input-side throttle; the spawn routine itself never rate-limits.
const SPARKLE_MIN_GAP_SECS: f32 = 0.05;
const Z_SPARKLES: f32 = 30.0;

/// One-shot screen lifecycle; there is no way back to the question.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Phase {
    #[default]
    Question,
    Hiding,
    Celebration,
}

#[derive(Resource, Default)]
pub struct CardState {
    pub phase: Phase,
    wait: f32,
    sparkle_gap: f32,
}

#[derive(Component)]
pub struct QuestionScreen;

#[derive(Component)]
pub struct CelebrationScreen;

#[derive(Component)]
pub struct Sparkle {
    lifetime: f32,
}

#[derive(Event)]
pub struct ShowCelebration;

/// Fired the moment the celebration screen activates; external wiring can
/// hang follow-up behavior off it.
#[derive(Event)]
pub struct CelebrationStarted;

pub struct CelebrationPlugin;

impl Plugin for CelebrationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Settings>()
            .init_resource::<CardState>()
            .add_event::<ShowCelebration>()
            .add_event::<CelebrationStarted>()
            .add_event::<HeartBurst>()
            .add_event::<StartHeartLoop>()
            .add_systems(
                Update,
                (
                    yes_button_input,
                    begin_show,
                    hiding_tick,
                    sparkle_trail,
                    reap_sparkles,
                ),
            );
    }
}

fn yes_button_input(
    card: Res<CardState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    buttons: Query<(&YesButton, &GlobalTransform)>,
    mut shows: EventWriter<ShowCelebration>,
) {
    if card.phase != Phase::Question {
        return;
    }
    let Ok(win) = windows.get_single() else {
        return;
    };
    let Ok((camera, cam_t)) = cam.get_single() else {
        return;
    };
    let Ok((button, button_t)) = buttons.get_single() else {
        return;
    };
    // The button grows with its tier, so hit-test the scaled box.
    let pos = button_t.translation().truncate();
    let half = button.size * button_t.scale().truncate().abs() / 2.0;
    let over_point = |world: Vec2| {
        world.x >= pos.x - half.x
            && world.x <= pos.x + half.x
            && world.y >= pos.y - half.y
            && world.y <= pos.y + half.y
    };

    if mouse.just_pressed(MouseButton::Left) {
        let clicked = win
            .cursor_position()
            .and_then(|c| camera.viewport_to_world_2d(cam_t, c).ok())
            .is_some_and(|w| over_point(w));
        if clicked {
            shows.send(ShowCelebration);
            return;
        }
    }
    for touch in touches.iter_just_pressed() {
        let Ok(world) = camera.viewport_to_world_2d(cam_t, touch.position()) else {
            continue;
        };
        if over_point(world) {
            shows.send(ShowCelebration);
            return;
        }
    }
}

fn begin_show(
    mut shows: EventReader<ShowCelebration>,
    mut state: ResMut<CardState>,
    mut question: Query<&mut Visibility, With<QuestionScreen>>,
    celebration: Query<(), With<CelebrationScreen>>,
) {
    if shows.is_empty() {
        return;
    }
    shows.clear();
    if state.phase != Phase::Question {
        return;
    }
    // Both screens must exist before anything is touched; otherwise abort
    // with no partial transition.
    if question.is_empty() || celebration.is_empty() {
        warn!("celebration: missing screen entities, transition aborted");
        return;
    }
    for mut v in question.iter_mut() {
        *v = Visibility::Hidden;
    }
    state.phase = Phase::Hiding;
    state.wait = HIDE_SECS;
}

fn hiding_tick(
    time: Res<Time>,
    settings: Res<Settings>,
    mut state: ResMut<CardState>,
    mut celebration: Query<&mut Visibility, With<CelebrationScreen>>,
    mut bursts: EventWriter<HeartBurst>,
    mut loops: EventWriter<StartHeartLoop>,
    mut started: EventWriter<CelebrationStarted>,
) {
    if state.phase != Phase::Hiding {
        return;
    }
    state.wait -= time.delta_secs();
    if state.wait > 0.0 {
        return;
    }
    // Late failures are logged and tolerated; the transition is not rolled
    // back.
    state.phase = Phase::Celebration;
    if celebration.is_empty() {
        warn!("celebration: celebration screen vanished mid-transition");
    }
    for mut v in celebration.iter_mut() {
        *v = Visibility::Visible;
    }
    bursts.send(HeartBurst::centered(CELEBRATION_BURST_COUNT));
    loops.send(StartHeartLoop {
        interval: settings.loop_secs,
    });
    started.send(CelebrationStarted);
}

fn sparkle_trail(
    time: Res<Time>,
    mut state: ResMut<CardState>,
    mut moves: EventReader<CursorMoved>,
    cam: Query<(&Camera, &GlobalTransform)>,
    mut cmd: Commands,
) {
    state.sparkle_gap -= time.delta_secs();
    if state.phase != Phase::Celebration {
        moves.clear();
        return;
    }
    let Ok((camera, cam_t)) = cam.get_single() else {
        return;
    };
    let mut rng = rand::rng();
    for mv in moves.read() {
        if state.sparkle_gap > 0.0 {
            continue;
        }
        let Ok(world) = camera.viewport_to_world_2d(cam_t, mv.position) else {
            continue;
        };
        spawn_sparkle(&mut cmd, &mut rng, world);
        state.sparkle_gap = SPARKLE_MIN_GAP_SECS;
    }
}

fn spawn_sparkle(cmd: &mut Commands, rng: &mut impl Rng, at: Vec2) {
    let glyph = SPARKLE_GLYPHS[rng.random_range(0..SPARKLE_GLYPHS.len())];
    let jitter = Vec2::new(
        rng.random_range(-SPARKLE_JITTER..SPARKLE_JITTER),
        rng.random_range(-SPARKLE_JITTER..SPARKLE_JITTER),
    );
    cmd.spawn((
        Text2d::new(glyph),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        Transform::from_translation((at + jitter).extend(Z_SPARKLES)),
        Sparkle {
            lifetime: SPARKLE_LIFETIME_SECS,
        },
    ));
}

fn reap_sparkles(time: Res<Time>, mut cmd: Commands, mut sparkles: Query<(Entity, &mut Sparkle)>) {
    let dt = time.delta_secs();
    for (e, mut s) in sparkles.iter_mut() {
        s.lifetime -= dt;
        if s.lifetime <= 0.0 {
            if let Some(mut ec) = cmd.get_entity(e) {
                ec.despawn();
            }
        }
    }
}
