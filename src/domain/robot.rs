//! Differential-wheeled robots and their sensor suite.

use once_cell::sync::Lazy;

use super::object::Body;
use super::{Color, Texture, Vector2};

/// Number of infrared proximity sensors on a [`Puck`].
pub const PROXIMITY_SENSOR_COUNT: usize = 8;

/// Number of pixel columns in a [`Puck`] camera image.
pub const CAMERA_PIXEL_COUNT: usize = 60;

/// Horizontal field of view of the camera, radians.
pub const CAMERA_FIELD_OF_VIEW: f64 = 0.2 * std::f64::consts::PI;

/// Maximum range of the infrared proximity sensors, meters.
pub const PROXIMITY_SENSOR_RANGE: f64 = 0.12;

/// Raw sensor response at zero distance against a fully reflective surface.
pub const PROXIMITY_SENSOR_MAX_VALUE: f64 = 3731.0;

pub const PUCK_RADIUS: f64 = 0.037;
pub const PUCK_HEIGHT: f64 = 0.047;
pub const PUCK_MASS: f64 = 0.152;
pub const PUCK_WHEEL_AXIS: f64 = 0.051;

/// Differential-wheeled drive train: two independently commanded wheels with
/// encoders and accumulated odometry.
#[derive(Clone, Debug)]
pub struct DiffDrive {
    body: Body,
    pub left_speed: f64,
    pub right_speed: f64,
    left_encoder: f64,
    right_encoder: f64,
    left_odometry: f64,
    right_odometry: f64,
    wheel_axis: f64,
}

impl DiffDrive {
    pub fn new(body: Body, wheel_axis: f64) -> Self {
        Self {
            body,
            left_speed: 0.0,
            right_speed: 0.0,
            left_encoder: 0.0,
            right_encoder: 0.0,
            left_odometry: 0.0,
            right_odometry: 0.0,
            wheel_axis,
        }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn left_encoder(&self) -> f64 {
        self.left_encoder
    }

    pub fn right_encoder(&self) -> f64 {
        self.right_encoder
    }

    pub fn left_odometry(&self) -> f64 {
        self.left_odometry
    }

    pub fn right_odometry(&self) -> f64 {
        self.right_odometry
    }

    /// Zero both encoder counters. Odometry keeps accumulating.
    pub fn reset_encoders(&mut self) {
        self.left_encoder = 0.0;
        self.right_encoder = 0.0;
    }

    /// Turn the commanded wheel speeds into a body twist and advance the
    /// encoder and odometry bookkeeping for one tick.
    pub(crate) fn apply_wheel_speeds(&mut self, dt: f64) {
        let forward = (self.left_speed + self.right_speed) / 2.0;
        let rotation = (self.right_speed - self.left_speed) / self.wheel_axis;

        let heading = self.body.angle();
        self.body.set_speed(Vector2::from_angle(heading) * forward);
        self.body.set_ang_speed(rotation);

        self.left_encoder += self.left_speed * dt;
        self.right_encoder += self.right_speed * dt;
        self.left_odometry += (self.left_speed * dt).abs();
        self.right_odometry += (self.right_speed * dt).abs();
    }
}

/// Readings of one infrared proximity sensor, computed at the end of the
/// previous tick.
#[derive(Clone, Copy, Debug, Default)]
struct IrSensor {
    value: f64,
    distance: f64,
}

/// Mounting pose of a proximity sensor in the robot frame.
#[derive(Clone, Copy, Debug)]
pub struct SensorPose {
    pub angle: f64,
    pub offset: Vector2,
}

static SENSOR_POSES: Lazy<[SensorPose; PROXIMITY_SENSOR_COUNT]> = Lazy::new(|| {
    // Ring layout: front-right around the back to front-left.
    let angles_deg = [-15.0, -45.0, -90.0, -150.0, 150.0, 90.0, 45.0, 15.0];
    angles_deg.map(|deg: f64| {
        let angle = deg.to_radians();
        SensorPose {
            angle,
            offset: Vector2::from_angle(angle) * PUCK_RADIUS,
        }
    })
});

/// Capabilities of a concrete robot. The sensor suite is fixed per variant;
/// the camera is optional.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PuckCapability {
    pub base_sensors: bool,
    pub camera: bool,
}

impl Default for PuckCapability {
    fn default() -> Self {
        Self {
            base_sensors: true,
            camera: true,
        }
    }
}

/// A hit reported by the world's ray queries, used to refresh sensors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub distance: f64,
    pub color: Color,
    pub infrared_reflectiveness: f64,
}

/// Concrete differential-wheeled robot with a ring of infrared proximity
/// sensors and an optional forward-facing camera.
#[derive(Clone, Debug)]
pub struct Puck {
    drive: DiffDrive,
    capability: PuckCapability,
    sensors: [IrSensor; PROXIMITY_SENSOR_COUNT],
    camera_image: Texture,
    control_function: Option<String>,
}

impl Puck {
    pub fn new(capability: PuckCapability) -> Self {
        Self {
            drive: DiffDrive::new(
                Body::cylindric(PUCK_RADIUS, PUCK_HEIGHT, PUCK_MASS),
                PUCK_WHEEL_AXIS,
            ),
            capability,
            sensors: [IrSensor::default(); PROXIMITY_SENSOR_COUNT],
            camera_image: Texture::new(),
            control_function: None,
        }
    }

    pub fn body(&self) -> &Body {
        self.drive.body()
    }

    pub fn body_mut(&mut self) -> &mut Body {
        self.drive.body_mut()
    }

    pub fn drive(&self) -> &DiffDrive {
        &self.drive
    }

    pub fn drive_mut(&mut self) -> &mut DiffDrive {
        &mut self.drive
    }

    pub fn capability(&self) -> PuckCapability {
        self.capability
    }

    /// Raw filtered sensor readings from the end of the previous tick.
    pub fn proximity_sensor_values(&self) -> [f64; PROXIMITY_SENSOR_COUNT] {
        self.sensors.map(|s| s.value)
    }

    /// Distance estimates derived from the raw readings, meters.
    pub fn proximity_sensor_distances(&self) -> [f64; PROXIMITY_SENSOR_COUNT] {
        self.sensors.map(|s| s.distance)
    }

    pub fn has_camera(&self) -> bool {
        self.capability.camera
    }

    /// The camera image rendered at the end of the previous tick. Empty until
    /// the first step, and always empty without the camera capability.
    pub fn camera_image(&self) -> &Texture {
        &self.camera_image
    }

    /// Name of the script routine overriding the per-tick control, if any.
    pub fn control_function(&self) -> Option<&str> {
        self.control_function.as_deref()
    }

    pub fn set_control_function(&mut self, function: Option<String>) {
        self.control_function = function;
    }

    /// Refresh the sensor suite from ray queries into the surrounding world.
    ///
    /// `cast` shoots a ray from a world-frame origin along a world-frame angle
    /// and reports the closest hit, ignoring this robot itself.
    pub(crate) fn refresh_sensors<F>(&mut self, mut cast: F)
    where
        F: FnMut(Vector2, f64) -> Option<RayHit>,
    {
        let pos = self.body().pos();
        let heading = self.body().angle();

        if self.capability.base_sensors {
            for (sensor, pose) in self.sensors.iter_mut().zip(SENSOR_POSES.iter()) {
                let origin = pos + pose.offset.rotated(heading);
                let hit = cast(origin, heading + pose.angle)
                    .filter(|hit| hit.distance <= PROXIMITY_SENSOR_RANGE);
                match hit {
                    Some(hit) => {
                        let closeness = 1.0 - hit.distance / PROXIMITY_SENSOR_RANGE;
                        sensor.value =
                            hit.infrared_reflectiveness * PROXIMITY_SENSOR_MAX_VALUE * closeness;
                        sensor.distance = hit.distance;
                    }
                    None => {
                        sensor.value = 0.0;
                        sensor.distance = PROXIMITY_SENSOR_RANGE;
                    }
                }
            }
        }

        if self.capability.camera {
            let origin = pos + Vector2::from_angle(heading) * PUCK_RADIUS;
            self.camera_image = (0..CAMERA_PIXEL_COUNT)
                .map(|i| {
                    let t = (i as f64 + 0.5) / CAMERA_PIXEL_COUNT as f64 - 0.5;
                    let ray_angle = heading + t * CAMERA_FIELD_OF_VIEW;
                    cast(origin, ray_angle)
                        .map(|hit| hit.color)
                        .unwrap_or(Color::BLACK)
                })
                .collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_straight_drive_twist() {
        let mut drive = DiffDrive::new(Body::cylindric(0.1, 0.1, 1.0), 0.05);
        drive.left_speed = 1.0;
        drive.right_speed = 1.0;
        drive.apply_wheel_speeds(0.1);
        assert_abs_diff_eq!(drive.body().speed().x(), 1.0);
        assert_abs_diff_eq!(drive.body().speed().y(), 0.0);
        assert_abs_diff_eq!(drive.body().ang_speed(), 0.0);
    }

    #[test]
    fn test_spin_in_place_twist() {
        let mut drive = DiffDrive::new(Body::cylindric(0.1, 0.1, 1.0), 0.05);
        drive.left_speed = -1.0;
        drive.right_speed = 1.0;
        drive.apply_wheel_speeds(0.1);
        assert_abs_diff_eq!(drive.body().speed().norm(), 0.0);
        assert_abs_diff_eq!(drive.body().ang_speed(), 40.0);
    }

    #[rstest]
    #[case::forward(0.5, 0.5)]
    #[case::reverse(-0.5, -0.5)]
    fn test_encoders_accumulate_displacement(#[case] left: f64, #[case] right: f64) {
        let mut drive = DiffDrive::new(Body::cylindric(0.1, 0.1, 1.0), 0.05);
        drive.left_speed = left;
        drive.right_speed = right;
        drive.apply_wheel_speeds(0.2);
        assert_abs_diff_eq!(drive.left_encoder(), left * 0.2);
        assert_abs_diff_eq!(drive.right_encoder(), right * 0.2);
        assert_abs_diff_eq!(drive.left_odometry(), (left * 0.2).abs());

        drive.reset_encoders();
        assert_abs_diff_eq!(drive.left_encoder(), 0.0);
        assert_abs_diff_eq!(drive.right_encoder(), 0.0);
        // odometry survives the reset
        assert_abs_diff_eq!(drive.left_odometry(), (left * 0.2).abs());
    }

    #[test]
    fn test_sensor_readings_from_ray_hits() {
        let mut puck = Puck::new(PuckCapability::default());
        puck.refresh_sensors(|_, _| {
            Some(RayHit {
                distance: PROXIMITY_SENSOR_RANGE / 2.0,
                color: Color::RED,
                infrared_reflectiveness: 1.0,
            })
        });
        for value in puck.proximity_sensor_values() {
            assert_abs_diff_eq!(value, PROXIMITY_SENSOR_MAX_VALUE / 2.0);
        }
        for distance in puck.proximity_sensor_distances() {
            assert_abs_diff_eq!(distance, PROXIMITY_SENSOR_RANGE / 2.0);
        }
        assert_eq!(puck.camera_image().len(), CAMERA_PIXEL_COUNT);
        assert_eq!(puck.camera_image().get(0), Some(Color::RED));
    }

    #[test]
    fn test_sensors_clear_when_nothing_in_range() {
        let mut puck = Puck::new(PuckCapability::default());
        puck.refresh_sensors(|_, _| None);
        for value in puck.proximity_sensor_values() {
            assert_abs_diff_eq!(value, 0.0);
        }
        for distance in puck.proximity_sensor_distances() {
            assert_abs_diff_eq!(distance, PROXIMITY_SENSOR_RANGE);
        }
    }

    #[test]
    fn test_no_camera_capability() {
        let mut puck = Puck::new(PuckCapability {
            base_sensors: true,
            camera: false,
        });
        puck.refresh_sensors(|_, _| None);
        assert!(!puck.has_camera());
        assert!(puck.camera_image().is_empty());
    }
}
