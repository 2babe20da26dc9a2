//! BE MINE - interactive greeting card
//! Say yes!

use bevy::prelude::*;

mod celebration;
mod hearts;
mod runaway;
mod settings;

use celebration::{CelebrationPlugin, CelebrationScreen, CelebrationStarted, QuestionScreen};
use hearts::{HeartsPlugin, StartHearts};
use runaway::{NoButton, NoLabel, RunawayPlugin, RunawayState, YesButton, YesLabel};
use settings::Settings;

// COLORS
const BG_COLOR: Color = Color::srgb(0.10, 0.04, 0.09);
const YES_COLOR: Color = Color::srgb(0.95, 0.30, 0.50);
const NO_COLOR: Color = Color::srgb(0.36, 0.36, 0.46);
const SOFT_WHITE: Color = Color::srgba(1.0, 1.0, 1.0, 0.85);

// Sizes
const BUTTON_W: f32 = 160.0;
const BUTTON_H: f32 = 64.0;
const BUTTON_GAP: f32 = 280.0;
const BUTTON_Y: f32 = -120.0;

fn main() {
    let _ = dotenvy::dotenv();
    let settings = Settings::from_env();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "BE MINE - say yes!".into(),
                resolution: (settings.window_w, settings.window_h).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(BG_COLOR))
        .insert_resource(settings)
        .add_plugins((HeartsPlugin, RunawayPlugin, CelebrationPlugin))
        .add_systems(Startup, setup)
        .add_systems(Update, log_celebration)
        .run();
}

/// Creates a rounded rectangle mesh for the buttons
fn create_rounded_rect_mesh(width: f32, height: f32, radius: f32) -> Mesh {
    use bevy::render::mesh::{Indices, PrimitiveTopology};

    let hw = width / 2.0;
    let hh = height / 2.0;
    let r = radius.min(hw).min(hh); // Clamp radius
    let segments = 8; // Segments per corner

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    // Center vertex
    positions.push([0.0, 0.0, 0.0]);
    uvs.push([0.5, 0.5]);

    // Generate vertices around the rounded rectangle
    let corners = [
        (hw - r, hh - r, 0.0),                          // Top-right
        (-hw + r, hh - r, std::f32::consts::FRAC_PI_2), // Top-left
        (-hw + r, -hh + r, std::f32::consts::PI),       // Bottom-left
        (hw - r, -hh + r, std::f32::consts::PI * 1.5),  // Bottom-right
    ];

    for (cx, cy, start_angle) in corners {
        for i in 0..=segments {
            let angle = start_angle + (i as f32 / segments as f32) * std::f32::consts::FRAC_PI_2;
            let x = cx + r * angle.cos();
            let y = cy + r * angle.sin();
            positions.push([x, y, 0.0]);
            uvs.push([(x / width) + 0.5, (y / height) + 0.5]);
        }
    }

    // Generate triangle fan indices
    let num_outer = positions.len() as u32 - 1;
    for i in 1..=num_outer {
        let next = if i == num_outer { 1 } else { i + 1 };
        indices.extend_from_slice(&[0, i, next]);
    }

    Mesh::new(PrimitiveTopology::TriangleList, default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

fn setup(
    mut cmd: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
    mut hearts: EventWriter<StartHearts>,
) {
    // Camera
    cmd.spawn(Camera2d);

    // Question screen: prompt + the two buttons
    cmd.spawn((
        Text2d::new("Will you be my Valentine?"),
        TextFont {
            font_size: 54.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0.0, 160.0, 10.0),
        QuestionScreen,
    ));
    cmd.spawn((
        Text2d::new("\u{1F49D}"),
        TextFont {
            font_size: 80.0,
            ..default()
        },
        Transform::from_xyz(0.0, 40.0, 10.0),
        QuestionScreen,
    ));

    let button_mesh = meshes.add(create_rounded_rect_mesh(BUTTON_W, BUTTON_H, 18.0));

    let yx = -BUTTON_GAP / 2.0;
    cmd.spawn((
        Mesh2d(button_mesh.clone()),
        MeshMaterial2d(mats.add(ColorMaterial::from(YES_COLOR))),
        Transform::from_xyz(yx, BUTTON_Y, 0.0),
        YesButton {
            size: Vec2::new(BUTTON_W, BUTTON_H),
        },
        QuestionScreen,
    ));
    cmd.spawn((
        Text2d::new("Yes"),
        TextFont {
            font_size: 32.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(yx, BUTTON_Y, 1.0),
        YesLabel,
        QuestionScreen,
    ));

    let nx = BUTTON_GAP / 2.0;
    cmd.spawn((
        Mesh2d(button_mesh.clone()),
        MeshMaterial2d(mats.add(ColorMaterial::from(NO_COLOR))),
        Transform::from_xyz(nx, BUTTON_Y, 0.0),
        NoButton {
            size: Vec2::new(BUTTON_W, BUTTON_H),
        },
        QuestionScreen,
    ));
    cmd.spawn((
        Text2d::new(runaway::MESSAGES[0]),
        TextFont {
            font_size: 32.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(nx, BUTTON_Y, 1.0),
        NoLabel,
        QuestionScreen,
    ));

    // Celebration screen, hidden until the transition
    cmd.spawn((
        Text2d::new("Yay! \u{1F496}"),
        TextFont {
            font_size: 96.0,
            ..default()
        },
        TextColor(YES_COLOR),
        Transform::from_xyz(0.0, 60.0, 10.0),
        Visibility::Hidden,
        CelebrationScreen,
    ));
    cmd.spawn((
        Text2d::new("I knew you'd say yes"),
        TextFont {
            font_size: 30.0,
            ..default()
        },
        TextColor(SOFT_WHITE),
        Transform::from_xyz(0.0, -40.0, 10.0),
        Visibility::Hidden,
        CelebrationScreen,
    ));

    hearts.send(StartHearts);
}

fn log_celebration(mut started: EventReader<CelebrationStarted>, state: Res<RunawayState>) {
    if started.is_empty() {
        return;
    }
    started.clear();
    info!("celebration started after {} escapes", state.escape_count());
}
