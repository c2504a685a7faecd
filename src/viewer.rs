//! Interactive 3D rendering of a running world.
//!
//! World coordinates map to render space as `(x, y) -> (x, up, -y)`, so the
//! simulation plane becomes the ground plane with +y up.

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::FRAC_PI_2;

use bevy::app::AppExit;
use bevy::core_pipeline::bloom::BloomSettings;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use tracing::error;

use crate::domain::{Arena, ObjectId, Shape};
use crate::driver::{STEP_DT, STEP_OVERSAMPLING};
use crate::resource::{CameraRigRes, ControllerRes, WorldRes};

const WALL_HEIGHT: f32 = 0.1;
const WALL_THICKNESS: f32 = 0.02;
const FLOOR_COLOR: Color = Color::rgb(0.85, 0.82, 0.75);
const UNBOUNDED_FLOOR_SIZE: f32 = 20.0;

const ROTATE_SPEED: f32 = 0.005;
const PAN_SPEED: f32 = 0.01;
const ZOOM_SPEED: f32 = 0.1;
const MIN_ALTITUDE: f32 = 0.05;

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneIndex>()
            .init_resource::<CameraState>()
            .insert_resource(StepTimer(Timer::from_seconds(
                STEP_DT as f32,
                TimerMode::Repeating,
            )))
            .add_systems(Startup, set_up_scene)
            .add_systems(
                Update,
                (advance_simulation, sync_objects, camera_input, apply_camera).chain(),
            )
            .add_systems(Update, toggle_help);
    }
}

#[derive(Resource)]
struct StepTimer(Timer);

#[derive(Component)]
struct HelpText;

struct ObjectVisual {
    entity: Entity,
    material: Handle<StandardMaterial>,
}

/// Render-side mirror of the world's object set, keyed by object identity.
#[derive(Resource, Default)]
struct SceneIndex {
    objects: BTreeMap<ObjectId, ObjectVisual>,
}

/// Camera placement in world coordinates, after the sign convention of the
/// initial rig has been applied.
#[derive(Resource, Default)]
struct CameraState {
    position: Vec2,
    altitude: f32,
    yaw: f32,
    pitch: f32,
}

fn to_render(x: f64, y: f64, up: f32) -> Vec3 {
    Vec3::new(x as f32, up, -(y as f32))
}

fn to_render_color(color: crate::domain::Color) -> Color {
    Color::rgba(
        color.r() as f32,
        color.g() as f32,
        color.b() as f32,
        color.a() as f32,
    )
}

fn set_up_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    world: NonSend<WorldRes>,
    rig: Res<CameraRigRes>,
    mut camera: ResMut<CameraState>,
) {
    // Caller coordinates arrive with the opposite sign convention for the
    // planar position and both view angles.
    camera.position = Vec2::new(-rig.position.x() as f32, -rig.position.y() as f32);
    camera.altitude = rig.altitude as f32;
    camera.yaw = -rig.yaw as f32;
    camera.pitch = -rig.pitch as f32;

    spawn_arena(
        &mut commands,
        &mut meshes,
        &mut materials,
        world.borrow().arena(),
    );

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 10_000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -1.0, 0.4, 0.0)),
        ..default()
    });

    commands.spawn((
        Camera3dBundle {
            camera: Camera {
                hdr: true,
                ..default()
            },
            tonemapping: Tonemapping::TonyMcMapface,
            ..default()
        },
        BloomSettings::NATURAL,
    ));

    commands.spawn((
        TextBundle::from_section(
            "ctrl + drag: rotate\nctrl + shift + drag: pan\nwheel: zoom\nT: toggle help",
            TextStyle {
                font_size: 14.0,
                ..default()
            },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            bottom: Val::Px(10.0),
            ..default()
        }),
        HelpText,
    ));
}

fn spawn_arena(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    arena: Arena,
) {
    let floor_material = materials.add(StandardMaterial {
        base_color: FLOOR_COLOR,
        perceptual_roughness: 1.0,
        ..default()
    });

    match arena {
        Arena::Unbounded => {
            commands.spawn(PbrBundle {
                mesh: meshes.add(
                    Plane3d::default()
                        .mesh()
                        .size(UNBOUNDED_FLOOR_SIZE, UNBOUNDED_FLOOR_SIZE),
                ),
                material: floor_material,
                ..default()
            });
        }
        Arena::Bounded {
            width,
            height,
            walls_color,
        } => {
            let (w, h) = (width as f32, height as f32);
            commands.spawn(PbrBundle {
                mesh: meshes.add(Plane3d::default().mesh().size(w, h)),
                material: floor_material,
                transform: Transform::from_translation(to_render(width / 2.0, height / 2.0, 0.0)),
                ..default()
            });

            let wall_material = materials.add(StandardMaterial {
                base_color: to_render_color(walls_color),
                ..default()
            });
            let spans = [
                // south, north, west, east
                (w / 2.0, -WALL_THICKNESS / 2.0, w, WALL_THICKNESS),
                (w / 2.0, h + WALL_THICKNESS / 2.0, w, WALL_THICKNESS),
                (-WALL_THICKNESS / 2.0, h / 2.0, WALL_THICKNESS, h),
                (w + WALL_THICKNESS / 2.0, h / 2.0, WALL_THICKNESS, h),
            ];
            for (x, y, length, depth) in spans {
                commands.spawn(PbrBundle {
                    mesh: meshes.add(Cuboid::new(length, WALL_HEIGHT, depth)),
                    material: wall_material.clone(),
                    transform: Transform::from_translation(to_render(
                        f64::from(x),
                        f64::from(y),
                        WALL_HEIGHT / 2.0,
                    )),
                    ..default()
                });
            }
        }
        Arena::Circular {
            radius,
            walls_color,
        } => {
            let r = radius as f32;
            commands.spawn(PbrBundle {
                mesh: meshes.add(Cylinder::new(r, 0.01)),
                material: floor_material,
                ..default()
            });
            commands.spawn(PbrBundle {
                mesh: meshes.add(Torus::new(r, r + WALL_THICKNESS)),
                material: materials.add(StandardMaterial {
                    base_color: to_render_color(walls_color),
                    ..default()
                }),
                transform: Transform::from_xyz(0.0, WALL_HEIGHT / 2.0, 0.0),
                ..default()
            });
        }
    }
}

fn advance_simulation(
    time: Res<Time>,
    mut timer: ResMut<StepTimer>,
    world: NonSend<WorldRes>,
    mut controller: NonSendMut<ControllerRes>,
    mut exit: EventWriter<AppExit>,
) {
    timer.0.tick(time.delta());
    for _ in 0..timer.0.times_finished_this_tick() {
        let result = world
            .borrow_mut()
            .step_with(STEP_DT, STEP_OVERSAMPLING, controller.get_mut());
        if let Err(err) = result {
            error!("simulation step failed: {err}");
            exit.send(AppExit);
            break;
        }
    }
}

fn sync_objects(
    world: NonSend<WorldRes>,
    mut index: ResMut<SceneIndex>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut transforms: Query<&mut Transform>,
) {
    let world = world.borrow();
    let live: BTreeSet<ObjectId> = world.object_ids().collect();

    for (id, slot) in world.objects() {
        let slot = slot.borrow();
        let body = slot.object.body();
        let target = Transform {
            translation: to_render(body.pos().x(), body.pos().y(), body.height() as f32 / 2.0),
            rotation: Quat::from_rotation_y(body.angle() as f32),
            ..default()
        };

        if let Some(visual) = index.objects.get(&id) {
            if let Ok(mut transform) = transforms.get_mut(visual.entity) {
                *transform = target;
            }
            if let Some(material) = materials.get_mut(&visual.material) {
                material.base_color = to_render_color(body.color());
            }
        } else {
            let mesh = match body.shape() {
                Shape::Cylindric { radius, height } => {
                    meshes.add(Cylinder::new(radius as f32, height as f32))
                }
                Shape::Rectangular { l1, l2, height } => {
                    meshes.add(Cuboid::new(l1 as f32, height as f32, l2 as f32))
                }
            };
            let material = materials.add(StandardMaterial {
                base_color: to_render_color(body.color()),
                ..default()
            });
            let entity = commands
                .spawn(PbrBundle {
                    mesh,
                    material: material.clone(),
                    transform: target,
                    ..default()
                })
                .id();
            index.objects.insert(id, ObjectVisual { entity, material });
        }
    }

    index.objects.retain(|id, visual| {
        let keep = live.contains(id);
        if !keep {
            commands.entity(visual.entity).despawn();
        }
        keep
    });
}

fn camera_input(
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    mut camera: ResMut<CameraState>,
) {
    let drag: Vec2 = motion.read().map(|event| event.delta).sum();
    let scroll: f32 = wheel.read().map(|event| event.y).sum();

    let ctrl = keys.pressed(KeyCode::ControlLeft) || keys.pressed(KeyCode::ControlRight);
    let shift = keys.pressed(KeyCode::ShiftLeft) || keys.pressed(KeyCode::ShiftRight);

    if ctrl && buttons.pressed(MouseButton::Left) {
        if shift {
            let (sin, cos) = camera.yaw.sin_cos();
            let right = Vec2::new(cos, -sin);
            let forward = Vec2::new(sin, cos);
            let pan = (right * -drag.x + forward * drag.y) * PAN_SPEED;
            camera.position += pan;
        } else {
            camera.yaw -= drag.x * ROTATE_SPEED;
            camera.pitch = (camera.pitch - drag.y * ROTATE_SPEED).clamp(-FRAC_PI_2, FRAC_PI_2);
        }
    } else if ctrl && shift && buttons.pressed(MouseButton::Right) {
        camera.altitude = (camera.altitude + drag.y * PAN_SPEED).max(MIN_ALTITUDE);
    }

    if scroll != 0.0 {
        camera.altitude = (camera.altitude - scroll * ZOOM_SPEED).max(MIN_ALTITUDE);
    }
}

fn toggle_help(
    keys: Res<ButtonInput<KeyCode>>,
    mut query: Query<&mut Visibility, With<HelpText>>,
) {
    if !keys.just_pressed(KeyCode::KeyT) {
        return;
    }
    for mut visibility in &mut query {
        *visibility = match *visibility {
            Visibility::Hidden => Visibility::Inherited,
            _ => Visibility::Hidden,
        };
    }
}

fn apply_camera(camera: Res<CameraState>, mut query: Query<&mut Transform, With<Camera3d>>) {
    let Ok(mut transform) = query.get_single_mut() else {
        return;
    };
    transform.translation = Vec3::new(camera.position.x, camera.altitude, -camera.position.y);
    transform.rotation = Quat::from_euler(EulerRot::YXZ, camera.yaw, camera.pitch, 0.0);
}
