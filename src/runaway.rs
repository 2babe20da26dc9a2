//! The evasive "No" button: hover, touch, or click it and it jumps to a fresh
//! safe spot, escalates its label, and feeds the "Yes" button's growth.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::Rng;

use crate::celebration::{CardState, Phase};
use crate::settings::Settings;

pub const MESSAGES: [&str; 10] = [
    "No",
    "Are you sure?",
    "Really sure?",
    "Think again!",
    "Last chance!",
    "Surely not?",
    "You might regret this!",
    "Give it another thought!",
    "Are you absolutely sure?",
    "This could be a mistake!",
];

/// Absolute companion scale per growth tier; tier 0 is the resting size.
pub const YES_TIER_SCALES: [f32; 5] = [1.0, 1.3, 1.6, 1.9, 2.2];

// Slight permanent scale-up once the button is in runaway mode.
const RUNAWAY_SCALE: f32 = 1.05;
const EASE_RATE: f32 = 12.0;

#[derive(Component)]
pub struct NoButton {
    pub size: Vec2,
}

#[derive(Component)]
pub struct YesButton {
    pub size: Vec2,
}

#[derive(Component)]
pub struct NoLabel;

#[derive(Component)]
pub struct YesLabel;

/// One qualifying interaction with the "No" button.
#[derive(Event)]
pub struct Escape;

/// Resets the counter and runaway flag and disarms the hover/touch triggers.
/// The click trigger stays armed.
#[derive(Event)]
pub struct ResetRunaway;

#[derive(Resource)]
pub struct RunawayState {
    escapes: u32,
    active: bool,
    hover_armed: bool,
    touch_armed: bool,
    hovering: bool,
    target: Option<Vec2>,
    yes_scale: f32,
}

impl Default for RunawayState {
    fn default() -> Self {
        Self {
            escapes: 0,
            active: false,
            hover_armed: true,
            touch_armed: true,
            hovering: false,
            target: None,
            yes_scale: YES_TIER_SCALES[0],
        }
    }
}

impl RunawayState {
    pub fn escape_count(&self) -> u32 {
        self.escapes
    }
}

pub struct RunawayPlugin;

impl Plugin for RunawayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Settings>()
            .init_resource::<RunawayState>()
            .init_resource::<CardState>()
            .add_event::<Escape>()
            .add_event::<ResetRunaway>()
            .add_systems(
                Update,
                (no_button_input, apply_escape, ease_buttons, handle_reset),
            );
    }
}

pub fn growth_tier(escapes: u32) -> usize {
    ((escapes / 2) as usize).min(YES_TIER_SCALES.len() - 1)
}

pub fn message_index(escapes: u32) -> usize {
    (escapes as usize).min(MESSAGES.len() - 1)
}

/// Random spot keeping the whole box inside the padded viewport, returned in
/// world coordinates. Degenerate viewports center the axis instead.
pub fn safe_position(rng: &mut impl Rng, viewport: Vec2, size: Vec2, padding: f32) -> Vec2 {
    let max_x = viewport.x - size.x - padding;
    let max_y = viewport.y - size.y - padding;
    let x = if max_x > padding {
        rng.random_range(padding..max_x)
    } else {
        (viewport.x - size.x) / 2.0
    };
    let y = if max_y > padding {
        rng.random_range(padding..max_y)
    } else {
        (viewport.y - size.y) / 2.0
    };
    Vec2::new(
        x + size.x / 2.0 - viewport.x / 2.0,
        viewport.y / 2.0 - (y + size.y / 2.0),
    )
}

fn no_button_input(
    card: Res<CardState>,
    mut state: ResMut<RunawayState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    buttons: Query<(&NoButton, &GlobalTransform)>,
    mut escapes: EventWriter<Escape>,
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
    let pos = button_t.translation().truncate();
    let over_point = |world: Vec2| {
        world.x >= pos.x - button.size.x / 2.0
            && world.x <= pos.x + button.size.x / 2.0
            && world.y >= pos.y - button.size.y / 2.0
            && world.y <= pos.y + button.size.y / 2.0
    };

    let cursor_world = win
        .cursor_position()
        .and_then(|c| camera.viewport_to_world_2d(cam_t, c).ok());
    let over = cursor_world.is_some_and(|w| over_point(w));

    // Pointer-enter is edge triggered: only a fresh arrival escapes.
    if over && !state.hovering && state.hover_armed {
        escapes.send(Escape);
    }
    state.hovering = over;

    if over && mouse.just_pressed(MouseButton::Left) {
        escapes.send(Escape);
    }

    if state.touch_armed {
        for touch in touches.iter_just_pressed() {
            let Ok(world) = camera.viewport_to_world_2d(cam_t, touch.position()) else {
                continue;
            };
            if over_point(world) {
                escapes.send(Escape);
            }
        }
    }
}

fn apply_escape(
    mut escapes: EventReader<Escape>,
    settings: Res<Settings>,
    mut state: ResMut<RunawayState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    buttons: Query<&NoButton>,
    mut labels: Query<&mut Text2d, With<NoLabel>>,
) {
    if escapes.is_empty() {
        return;
    }
    let count = escapes.read().count() as u32;
    let Ok(button) = buttons.get_single() else {
        warn!("runaway: no-button entity missing, escape dropped");
        return;
    };
    let Ok(win) = windows.get_single() else {
        warn!("runaway: no primary window, escape dropped");
        return;
    };
    let viewport = Vec2::new(win.width(), win.height());
    let mut rng = rand::rng();

    for _ in 0..count {
        state.active = true;
        state.target = Some(safe_position(
            &mut rng,
            viewport,
            button.size,
            settings.edge_padding,
        ));
        let msg = MESSAGES[message_index(state.escapes)];
        for mut label in labels.iter_mut() {
            label.0 = msg.to_string();
        }
        state.escapes += 1;
    }

    // Companion appearance is recomputed from the counter alone.
    state.yes_scale = YES_TIER_SCALES[growth_tier(state.escapes)];
}

fn ease_buttons(
    time: Res<Time>,
    state: Res<RunawayState>,
    mut no_q: Query<(&NoButton, &mut Transform)>,
    mut no_labels: Query<&mut Transform, (With<NoLabel>, Without<NoButton>)>,
    mut yes_q: Query<(&YesButton, &mut Transform), (Without<NoButton>, Without<NoLabel>)>,
    mut yes_labels: Query<
        &mut Transform,
        (
            With<YesLabel>,
            Without<NoButton>,
            Without<NoLabel>,
            Without<YesButton>,
        ),
    >,
) {
    let k = (EASE_RATE * time.delta_secs()).min(1.0);

    for (_, mut t) in no_q.iter_mut() {
        if let Some(target) = state.target {
            t.translation.x = t.translation.x * (1.0 - k) + target.x * k;
            t.translation.y = t.translation.y * (1.0 - k) + target.y * k;
        }
        let scale = if state.active { RUNAWAY_SCALE } else { 1.0 };
        t.scale = t.scale.lerp(Vec3::splat(scale), k);
    }
    for mut lt in no_labels.iter_mut() {
        if let Ok((_, bt)) = no_q.get_single() {
            lt.translation.x = bt.translation.x;
            lt.translation.y = bt.translation.y;
            lt.scale = bt.scale;
        }
    }

    for (_, mut t) in yes_q.iter_mut() {
        t.scale = t.scale.lerp(Vec3::splat(state.yes_scale), k);
    }
    for mut lt in yes_labels.iter_mut() {
        if let Ok((_, bt)) = yes_q.get_single() {
            lt.translation.x = bt.translation.x;
            lt.translation.y = bt.translation.y;
            lt.scale = bt.scale;
        }
    }
}

fn handle_reset(mut resets: EventReader<ResetRunaway>, mut state: ResMut<RunawayState>) {
    if resets.is_empty() {
        return;
    }
    resets.clear();
    state.escapes = 0;
    state.active = false;
    state.hovering = false;
    state.target = None;
    // Hover and touch stand down; the click path stays armed, matching the
    // original page where the click handler was never unregistered.
    state.hover_armed = false;
    state.touch_armed = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::time::TimeUpdateStrategy;
    use bevy::window::PrimaryWindow;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            50,
        )));
        // Input systems read ButtonInput/Touches, which DefaultPlugins supplies
        // in the app but MinimalPlugins does not.
        app.add_plugins(bevy::input::InputPlugin);
        app.add_plugins(RunawayPlugin);
        app.world_mut().spawn((Window::default(), PrimaryWindow));
        app.world_mut().spawn((
            NoButton {
                size: Vec2::new(160.0, 64.0),
            },
            Transform::default(),
        ));
        app.world_mut()
            .spawn((Text2d::new(MESSAGES[0]), NoLabel, Transform::default()));
        app
    }

    #[test]
    fn growth_tier_follows_counter() {
        let expect = [
            (0, 0),
            (1, 0),
            (2, 1),
            (3, 1),
            (4, 2),
            (7, 3),
            (8, 4),
            (9, 4),
            (100, 4),
        ];
        for (count, tier) in expect {
            assert_eq!(growth_tier(count), tier, "count {count}");
        }
    }

    #[test]
    fn message_index_clamps_to_last() {
        assert_eq!(message_index(0), 0);
        assert_eq!(message_index(5), 5);
        assert_eq!(message_index(9), 9);
        assert_eq!(message_index(10), 9);
        assert_eq!(message_index(1000), 9);
    }

    #[test]
    fn safe_position_respects_padding_bounds() {
        let viewport = Vec2::new(800.0, 600.0);
        let size = Vec2::new(100.0, 40.0);
        let padding = 20.0;
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let world = safe_position(&mut rng, viewport, size, padding);
            // back to top-left coordinates to mirror the page layout
            let x = world.x + viewport.x / 2.0 - size.x / 2.0;
            let y = viewport.y / 2.0 - world.y - size.y / 2.0;
            assert!((20.0..=680.0).contains(&x), "x {x} out of bounds");
            assert!((20.0..=540.0).contains(&y), "y {y} out of bounds");
        }
    }

    #[test]
    fn safe_position_centers_degenerate_viewport() {
        let mut rng = StdRng::seed_from_u64(7);
        let world = safe_position(&mut rng, Vec2::new(120.0, 80.0), Vec2::new(100.0, 60.0), 20.0);
        assert_eq!(world, Vec2::ZERO);
    }

    #[test]
    fn escape_count_tracks_events_and_reset() {
        let mut app = test_app();
        for _ in 0..3 {
            app.world_mut().send_event(Escape);
            app.update();
        }
        app.update();
        {
            let state = app.world().resource::<RunawayState>();
            assert_eq!(state.escape_count(), 3);
            assert!(state.active);
            assert_eq!(state.yes_scale, YES_TIER_SCALES[1]);
        }
        app.world_mut().send_event(ResetRunaway);
        app.update();
        let state = app.world().resource::<RunawayState>();
        assert_eq!(state.escape_count(), 0);
        assert!(!state.active);
        assert!(!state.hover_armed);
        assert!(!state.touch_armed);
    }

    #[test]
    fn escape_updates_label_from_pre_increment_count() {
        let mut app = test_app();
        app.world_mut().send_event(Escape);
        app.update();
        app.update();
        let mut labels = app.world_mut().query_filtered::<&Text2d, With<NoLabel>>();
        let label = labels.single(app.world());
        assert_eq!(label.0, MESSAGES[0]);

        for _ in 0..15 {
            app.world_mut().send_event(Escape);
            app.update();
        }
        app.update();
        let mut labels = app.world_mut().query_filtered::<&Text2d, With<NoLabel>>();
        let label = labels.single(app.world());
        assert_eq!(label.0, MESSAGES[9]);
        assert_eq!(
            app.world().resource::<RunawayState>().yes_scale,
            YES_TIER_SCALES[4]
        );
    }

    #[test]
    fn escape_without_button_is_logged_not_fatal() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::input::InputPlugin);
        app.add_plugins(RunawayPlugin);
        app.world_mut().spawn((Window::default(), PrimaryWindow));
        app.world_mut().send_event(Escape);
        app.update();
        app.update();
        assert_eq!(app.world().resource::<RunawayState>().escape_count(), 0);
    }
}
