//! The script-facing object model: handles over worlds, simulated objects and
//! textures, and the registration of every type, property and method scripts
//! can reach.
//!
//! One handle type covers the whole object hierarchy. Properties shared by all
//! physical objects work on any handle; robot-only members fail with a
//! descriptive error on passive objects instead of being absent.

use std::cell::RefCell;
use std::rc::Rc;

use rhai::{Array, Dynamic, Engine, EvalAltResult};

use super::{marshal, BridgeError};
use crate::domain::{
    Body, Color, Ownership, Puck, SimObject, SimSlot, Texture, World, WorldError,
};
use crate::domain::{ObjectRef, Vector2};

type RhaiResult<T> = Result<T, Box<EvalAltResult>>;

/// Script handle to a simulated object. Clones share the same underlying
/// slot, and the slot is the same one a world steps, so scripts always
/// observe live state.
#[derive(Clone)]
pub struct ObjectHandle(pub(crate) ObjectRef);

impl ObjectHandle {
    pub fn passive(body: Body) -> Self {
        Self(Rc::new(RefCell::new(SimSlot::new(SimObject::Passive(body)))))
    }

    pub fn puck(puck: Puck) -> Self {
        Self(Rc::new(RefCell::new(SimSlot::new(SimObject::Puck(puck)))))
    }

    pub(crate) fn from_ref(slot: ObjectRef) -> Self {
        Self(slot)
    }

    pub fn slot(&self) -> &ObjectRef {
        &self.0
    }

    fn live(&self) -> Result<(), BridgeError> {
        if self.0.borrow().registration.is_destroyed() {
            return Err(WorldError::Destroyed.into());
        }
        Ok(())
    }

    fn with_body<T>(&self, read: impl FnOnce(&Body) -> T) -> RhaiResult<T> {
        self.live()?;
        Ok(read(self.0.borrow().object.body()))
    }

    fn with_body_mut<T>(&self, write: impl FnOnce(&mut Body) -> T) -> RhaiResult<T> {
        self.live()?;
        Ok(write(self.0.borrow_mut().object.body_mut()))
    }

    fn with_puck<T>(
        &self,
        property: &'static str,
        read: impl FnOnce(&Puck) -> T,
    ) -> RhaiResult<T> {
        self.live()?;
        let slot = self.0.borrow();
        match slot.object.as_puck() {
            Some(puck) => Ok(read(puck)),
            None => Err(BridgeError::NotARobot { property }.into()),
        }
    }

    fn with_puck_mut<T>(
        &self,
        property: &'static str,
        write: impl FnOnce(&mut Puck) -> T,
    ) -> RhaiResult<T> {
        self.live()?;
        let mut slot = self.0.borrow_mut();
        match slot.object.as_puck_mut() {
            Some(puck) => Ok(write(puck)),
            None => Err(BridgeError::NotARobot { property }.into()),
        }
    }
}

/// Script handle to a world. Clones share the same world.
#[derive(Clone)]
pub struct WorldHandle(pub(crate) Rc<RefCell<World>>);

impl WorldHandle {
    pub fn new(world: World) -> Self {
        Self(Rc::new(RefCell::new(world)))
    }

    pub fn world(&self) -> &Rc<RefCell<World>> {
        &self.0
    }

    /// Borrow the world mutably, reporting reentrant access from inside a
    /// running step instead of panicking.
    pub(crate) fn lock(&self) -> Result<std::cell::RefMut<'_, World>, BridgeError> {
        self.0.try_borrow_mut().map_err(|_| BridgeError::WorldBusy)
    }

    fn add_object(&mut self, object: ObjectHandle) -> RhaiResult<()> {
        let mut world = self.lock()?;
        world.add_object(&object.0).map_err(BridgeError::from)?;
        Ok(())
    }

    fn remove_object(&mut self, object: ObjectHandle) -> RhaiResult<()> {
        let mut world = self.lock()?;
        world.remove_object(&object.0).map_err(BridgeError::from)?;
        Ok(())
    }

    fn take_object_ownership(&mut self, world_owns: bool) -> RhaiResult<()> {
        let ownership = if world_owns {
            Ownership::WorldOwns
        } else {
            Ownership::CallerOwns
        };
        self.lock()?.set_ownership(ownership).map_err(BridgeError::from)?;
        Ok(())
    }
}

/// Script handle to a texture, one color per pixel column.
#[derive(Clone, Debug, Default)]
pub struct TextureHandle(pub(crate) Texture);

impl TextureHandle {
    pub fn texture(&self) -> &Texture {
        &self.0
    }
}

fn sensor_array(values: [f64; crate::domain::PROXIMITY_SENSOR_COUNT]) -> Array {
    values.into_iter().map(Dynamic::from_float).collect()
}

/// Register the value types and the object model. Constructors that need the
/// script host (robots, stepping) are registered separately by the host.
pub(crate) fn register_api(engine: &mut Engine) {
    // Vectors cross the boundary as plain two-element arrays; the constructor
    // is a convenience producing the canonical representation.
    engine.register_fn("Vector2", |x: Dynamic, y: Dynamic| -> RhaiResult<Array> {
        Ok(marshal::vector_to_array(Vector2::new(
            marshal::scalar_or_err(&x)?,
            marshal::scalar_or_err(&y)?,
        )))
    });
    register_color(engine);
    register_texture(engine);
    register_object(engine);
    register_world(engine);
}

fn register_color(engine: &mut Engine) {
    engine
        .register_type_with_name::<Color>("Color")
        .register_fn("Color", Color::default)
        .register_fn("Color", |r: Dynamic| -> RhaiResult<Color> {
            Ok(Color::new(marshal::scalar_or_err(&r)?, 0.0, 0.0, 1.0))
        })
        .register_fn("Color", |r: Dynamic, g: Dynamic| -> RhaiResult<Color> {
            Ok(Color::new(
                marshal::scalar_or_err(&r)?,
                marshal::scalar_or_err(&g)?,
                0.0,
                1.0,
            ))
        })
        .register_fn("Color", |r: Dynamic, g: Dynamic, b: Dynamic| -> RhaiResult<Color> {
            Ok(Color::new(
                marshal::scalar_or_err(&r)?,
                marshal::scalar_or_err(&g)?,
                marshal::scalar_or_err(&b)?,
                1.0,
            ))
        })
        .register_fn(
            "Color",
            |r: Dynamic, g: Dynamic, b: Dynamic, a: Dynamic| -> RhaiResult<Color> {
                Ok(Color::new(
                    marshal::scalar_or_err(&r)?,
                    marshal::scalar_or_err(&g)?,
                    marshal::scalar_or_err(&b)?,
                    marshal::scalar_or_err(&a)?,
                ))
            },
        )
        .register_get("r", |c: &mut Color| c.r())
        .register_get("g", |c: &mut Color| c.g())
        .register_get("b", |c: &mut Color| c.b())
        .register_get("a", |c: &mut Color| c.a())
        .register_set("r", |c: &mut Color, v: Dynamic| -> RhaiResult<()> {
            c.set_r(marshal::scalar_or_err(&v)?);
            Ok(())
        })
        .register_set("g", |c: &mut Color, v: Dynamic| -> RhaiResult<()> {
            c.set_g(marshal::scalar_or_err(&v)?);
            Ok(())
        })
        .register_set("b", |c: &mut Color, v: Dynamic| -> RhaiResult<()> {
            c.set_b(marshal::scalar_or_err(&v)?);
            Ok(())
        })
        .register_set("a", |c: &mut Color, v: Dynamic| -> RhaiResult<()> {
            c.set_a(marshal::scalar_or_err(&v)?);
            Ok(())
        })
        .register_get("components", |c: &mut Color| marshal::components_to_array(*c))
        .register_set("components", |c: &mut Color, v: Dynamic| -> RhaiResult<()> {
            c.set_components(marshal::components_from_dynamic(&v)?);
            Ok(())
        })
        .register_fn("threshold", |c: &mut Color| c.threshold(0.5))
        .register_fn("threshold", |c: &mut Color, limit: Dynamic| -> RhaiResult<Color> {
            Ok(c.threshold(marshal::scalar_or_err(&limit)?))
        })
        .register_fn("to_gray", |c: &mut Color| c.to_gray())
        .register_fn("to_string", |c: &mut Color| c.to_string())
        .register_fn("to_debug", |c: &mut Color| c.to_string())
        .register_fn("==", |a: Color, b: Color| a == b)
        .register_fn("!=", |a: Color, b: Color| a != b)
        .register_fn("+", |a: Color, b: Color| a + b)
        .register_fn("-", |a: Color, b: Color| a - b)
        .register_fn("+", |a: Color, b: f64| a + b)
        .register_fn("-", |a: Color, b: f64| a - b)
        .register_fn("*", |a: Color, b: f64| a * b)
        .register_fn("/", |a: Color, b: f64| a / b)
        .register_fn("+", |a: Color, b: i64| a + b as f64)
        .register_fn("-", |a: Color, b: i64| a - b as f64)
        .register_fn("*", |a: Color, b: i64| a * b as f64)
        .register_fn("/", |a: Color, b: i64| a / b as f64);
}

fn register_texture(engine: &mut Engine) {
    engine
        .register_type_with_name::<TextureHandle>("Texture")
        .register_fn("Texture", TextureHandle::default)
        .register_get("len", |t: &mut TextureHandle| t.0.len() as i64)
        .register_fn("len", |t: &mut TextureHandle| t.0.len() as i64)
        .register_fn("push", |t: &mut TextureHandle, color: Color| t.0.push(color))
        .register_indexer_get(|t: &mut TextureHandle, index: i64| -> RhaiResult<Color> {
            usize::try_from(index)
                .ok()
                .and_then(|i| t.0.get(i))
                .ok_or_else(|| {
                    BridgeError::IndexOutOfRange {
                        index,
                        len: t.0.len(),
                    }
                    .into()
                })
        })
        .register_indexer_set(
            |t: &mut TextureHandle, index: i64, color: Color| -> RhaiResult<()> {
                let valid = usize::try_from(index)
                    .ok()
                    .map(|i| t.0.set(i, color))
                    .unwrap_or(false);
                if valid {
                    Ok(())
                } else {
                    Err(BridgeError::IndexOutOfRange {
                        index,
                        len: t.0.len(),
                    }
                    .into())
                }
            },
        );
}

fn register_object(engine: &mut Engine) {
    engine
        .register_type_with_name::<ObjectHandle>("PhysicalObject")
        .register_fn(
            "CircularObject",
            |radius: Dynamic, height: Dynamic, mass: Dynamic| -> RhaiResult<ObjectHandle> {
                Ok(ObjectHandle::passive(Body::cylindric(
                    marshal::scalar_or_err(&radius)?,
                    marshal::scalar_or_err(&height)?,
                    marshal::scalar_or_err(&mass)?,
                )))
            },
        )
        .register_fn(
            "CircularObject",
            |radius: Dynamic,
             height: Dynamic,
             mass: Dynamic,
             color: Color|
             -> RhaiResult<ObjectHandle> {
                let mut body = Body::cylindric(
                    marshal::scalar_or_err(&radius)?,
                    marshal::scalar_or_err(&height)?,
                    marshal::scalar_or_err(&mass)?,
                );
                body.set_color(color);
                Ok(ObjectHandle::passive(body))
            },
        )
        .register_fn(
            "RectangularObject",
            |l1: Dynamic, l2: Dynamic, height: Dynamic, mass: Dynamic| -> RhaiResult<ObjectHandle> {
                Ok(ObjectHandle::passive(Body::rectangular(
                    marshal::scalar_or_err(&l1)?,
                    marshal::scalar_or_err(&l2)?,
                    marshal::scalar_or_err(&height)?,
                    marshal::scalar_or_err(&mass)?,
                )))
            },
        )
        .register_fn(
            "RectangularObject",
            |l1: Dynamic,
             l2: Dynamic,
             height: Dynamic,
             mass: Dynamic,
             color: Color|
             -> RhaiResult<ObjectHandle> {
                let mut body = Body::rectangular(
                    marshal::scalar_or_err(&l1)?,
                    marshal::scalar_or_err(&l2)?,
                    marshal::scalar_or_err(&height)?,
                    marshal::scalar_or_err(&mass)?,
                );
                body.set_color(color);
                Ok(ObjectHandle::passive(body))
            },
        )
        .register_fn("==", |a: ObjectHandle, b: ObjectHandle| Rc::ptr_eq(&a.0, &b.0))
        .register_fn("!=", |a: ObjectHandle, b: ObjectHandle| !Rc::ptr_eq(&a.0, &b.0));

    register_body_properties(engine);
    register_robot_members(engine);
}

fn register_body_properties(engine: &mut Engine) {
    engine
        .register_get("pos", |o: &mut ObjectHandle| -> RhaiResult<Array> {
            o.with_body(|b| marshal::vector_to_array(b.pos()))
        })
        .register_set("pos", |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
            let pos = marshal::vector_from_dynamic(&v)?;
            o.with_body_mut(|b| b.set_pos(pos))
        })
        .register_get("angle", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_body(Body::angle)
        })
        .register_set("angle", |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
            let angle = marshal::scalar_or_err(&v)?;
            o.with_body_mut(|b| b.set_angle(angle))
        })
        .register_get("speed", |o: &mut ObjectHandle| -> RhaiResult<Array> {
            o.with_body(|b| marshal::vector_to_array(b.speed()))
        })
        .register_set("speed", |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
            let speed = marshal::vector_from_dynamic(&v)?;
            o.with_body_mut(|b| b.set_speed(speed))
        })
        .register_get("ang_speed", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_body(Body::ang_speed)
        })
        .register_set(
            "ang_speed",
            |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
                let ang_speed = marshal::scalar_or_err(&v)?;
                o.with_body_mut(|b| b.set_ang_speed(ang_speed))
            },
        )
        .register_get("color", |o: &mut ObjectHandle| -> RhaiResult<Color> {
            o.with_body(Body::color)
        })
        .register_set("color", |o: &mut ObjectHandle, color: Color| -> RhaiResult<()> {
            o.with_body_mut(|b| b.set_color(color))
        })
        .register_get(
            "infrared_reflectiveness",
            |o: &mut ObjectHandle| -> RhaiResult<f64> { o.with_body(Body::infrared_reflectiveness) },
        )
        .register_set(
            "infrared_reflectiveness",
            |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
                let value = marshal::scalar_or_err(&v)?;
                o.with_body_mut(|b| b.set_infrared_reflectiveness(value))
            },
        )
        .register_get("radius", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_body(Body::radius)
        })
        .register_get("height", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_body(Body::height)
        })
        .register_get("is_cylindric", |o: &mut ObjectHandle| -> RhaiResult<bool> {
            o.with_body(Body::is_cylindric)
        })
        .register_get("mass", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_body(Body::mass)
        })
        .register_get(
            "moment_of_inertia",
            |o: &mut ObjectHandle| -> RhaiResult<f64> { o.with_body(Body::moment_of_inertia) },
        )
        .register_get(
            "collision_elasticity",
            |o: &mut ObjectHandle| -> RhaiResult<f64> { o.with_body(|b| b.collision_elasticity) },
        )
        .register_set(
            "collision_elasticity",
            |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
                let value = marshal::scalar_or_err(&v)?;
                o.with_body_mut(|b| b.collision_elasticity = value)
            },
        )
        .register_get(
            "dry_friction_coefficient",
            |o: &mut ObjectHandle| -> RhaiResult<f64> {
                o.with_body(|b| b.dry_friction_coefficient)
            },
        )
        .register_set(
            "dry_friction_coefficient",
            |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
                let value = marshal::scalar_or_err(&v)?;
                o.with_body_mut(|b| b.dry_friction_coefficient = value)
            },
        )
        .register_get(
            "viscous_friction_coefficient",
            |o: &mut ObjectHandle| -> RhaiResult<f64> {
                o.with_body(|b| b.viscous_friction_coefficient)
            },
        )
        .register_set(
            "viscous_friction_coefficient",
            |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
                let value = marshal::scalar_or_err(&v)?;
                o.with_body_mut(|b| b.viscous_friction_coefficient = value)
            },
        )
        .register_get(
            "viscous_moment_friction_coefficient",
            |o: &mut ObjectHandle| -> RhaiResult<f64> {
                o.with_body(|b| b.viscous_moment_friction_coefficient)
            },
        )
        .register_set(
            "viscous_moment_friction_coefficient",
            |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
                let value = marshal::scalar_or_err(&v)?;
                o.with_body_mut(|b| b.viscous_moment_friction_coefficient = value)
            },
        );
}

fn register_robot_members(engine: &mut Engine) {
    engine
        .register_get("left_speed", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_puck("left_speed", |p| p.drive().left_speed)
        })
        .register_set(
            "left_speed",
            |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
                let speed = marshal::scalar_or_err(&v)?;
                o.with_puck_mut("left_speed", |p| p.drive_mut().left_speed = speed)
            },
        )
        .register_get("right_speed", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_puck("right_speed", |p| p.drive().right_speed)
        })
        .register_set(
            "right_speed",
            |o: &mut ObjectHandle, v: Dynamic| -> RhaiResult<()> {
                let speed = marshal::scalar_or_err(&v)?;
                o.with_puck_mut("right_speed", |p| p.drive_mut().right_speed = speed)
            },
        )
        .register_get("left_encoder", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_puck("left_encoder", |p| p.drive().left_encoder())
        })
        .register_get("right_encoder", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_puck("right_encoder", |p| p.drive().right_encoder())
        })
        .register_get("left_odometry", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_puck("left_odometry", |p| p.drive().left_odometry())
        })
        .register_get("right_odometry", |o: &mut ObjectHandle| -> RhaiResult<f64> {
            o.with_puck("right_odometry", |p| p.drive().right_odometry())
        })
        .register_fn("reset_encoders", |o: &mut ObjectHandle| -> RhaiResult<()> {
            o.with_puck_mut("reset_encoders", |p| p.drive_mut().reset_encoders())
        })
        .register_get(
            "proximity_sensor_values",
            |o: &mut ObjectHandle| -> RhaiResult<Array> {
                o.with_puck("proximity_sensor_values", |p| {
                    sensor_array(p.proximity_sensor_values())
                })
            },
        )
        .register_get(
            "proximity_sensor_distances",
            |o: &mut ObjectHandle| -> RhaiResult<Array> {
                o.with_puck("proximity_sensor_distances", |p| {
                    sensor_array(p.proximity_sensor_distances())
                })
            },
        )
        .register_get("has_camera", |o: &mut ObjectHandle| -> RhaiResult<bool> {
            o.with_puck("has_camera", Puck::has_camera)
        })
        .register_get(
            "camera_image",
            |o: &mut ObjectHandle| -> RhaiResult<TextureHandle> {
                let image = o.with_puck("camera_image", |p| {
                    p.has_camera().then(|| p.camera_image().clone())
                })?;
                image
                    .map(TextureHandle)
                    .ok_or_else(|| BridgeError::NoCamera.into())
            },
        )
        .register_fn(
            "set_control_function",
            |o: &mut ObjectHandle, name: &str| -> RhaiResult<()> {
                o.with_puck_mut("set_control_function", |p| {
                    p.set_control_function(Some(name.to_owned()))
                })
            },
        )
        .register_fn(
            "clear_control_function",
            |o: &mut ObjectHandle| -> RhaiResult<()> {
                o.with_puck_mut("clear_control_function", |p| p.set_control_function(None))
            },
        );
}

fn register_world(engine: &mut Engine) {
    engine
        .register_type_with_name::<WorldHandle>("World")
        .register_fn("World", || WorldHandle::new(World::unbounded()))
        .register_fn("World", |radius: Dynamic| -> RhaiResult<WorldHandle> {
            Ok(WorldHandle::new(World::circular(
                marshal::scalar_or_err(&radius)?,
                Color::default(),
            )))
        })
        .register_fn(
            "World",
            |first: Dynamic, second: Dynamic| -> RhaiResult<WorldHandle> {
                // Two numbers are a rectangle, a radius and a color a disc.
                if let Some(color) = second.clone().try_cast::<Color>() {
                    Ok(WorldHandle::new(World::circular(
                        marshal::scalar_or_err(&first)?,
                        color,
                    )))
                } else {
                    Ok(WorldHandle::new(World::bounded(
                        marshal::scalar_or_err(&first)?,
                        marshal::scalar_or_err(&second)?,
                        Color::default(),
                    )))
                }
            },
        )
        .register_fn(
            "World",
            |width: Dynamic, height: Dynamic, walls_color: Color| -> RhaiResult<WorldHandle> {
                Ok(WorldHandle::new(World::bounded(
                    marshal::scalar_or_err(&width)?,
                    marshal::scalar_or_err(&height)?,
                    walls_color,
                )))
            },
        )
        .register_get("object_count", |w: &mut WorldHandle| -> RhaiResult<i64> {
            Ok(w.lock()?.object_count() as i64)
        })
        .register_fn("add_object", WorldHandle::add_object)
        .register_fn("remove_object", WorldHandle::remove_object)
        .register_fn("take_object_ownership", WorldHandle::take_object_ownership)
        .register_fn(
            "contains",
            |w: &mut WorldHandle, object: ObjectHandle| -> RhaiResult<bool> {
                Ok(w.lock()?.contains(&object.0))
            },
        )
        .register_fn(
            "set_random_seed",
            |w: &mut WorldHandle, seed: i64| -> RhaiResult<()> {
                w.lock()?.set_random_seed(seed as u64);
                Ok(())
            },
        )
        .register_fn(
            "random",
            |w: &mut WorldHandle, lo: Dynamic, hi: Dynamic| -> RhaiResult<f64> {
                let lo = marshal::scalar_or_err(&lo)?;
                let hi = marshal::scalar_or_err(&hi)?;
                Ok(w.lock()?.random_range(lo, hi))
            },
        );
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rhai::Scope;

    use super::*;
    use crate::domain::PuckCapability;

    fn engine() -> Engine {
        let mut engine = Engine::new();
        register_api(&mut engine);
        engine
    }

    fn puck_scope() -> Scope<'static> {
        let mut scope = Scope::new();
        scope.push("r", ObjectHandle::puck(Puck::new(PuckCapability::default())));
        scope
    }

    #[test]
    fn test_pos_round_trip_accepts_mixed_numerics() {
        let engine = engine();
        let out: Array = engine
            .eval("let o = CircularObject(0.1, 0.1, 1.0); o.pos = [1, 2.5]; o.pos")
            .unwrap();
        assert_abs_diff_eq!(out[0].as_float().unwrap(), 1.0);
        assert_abs_diff_eq!(out[1].as_float().unwrap(), 2.5);
    }

    #[test]
    fn test_pos_rejects_malformed_sequences() {
        let engine = engine();
        let err = engine
            .eval::<()>("let o = CircularObject(0.1, 0.1, 1.0); o.pos = [1.0, 2.0, 3.0];")
            .unwrap_err();
        assert!(err.to_string().contains("numeric components"));

        let err = engine
            .eval::<()>(r#"let o = CircularObject(0.1, 0.1, 1.0); o.pos = [1.0, "two"];"#)
            .unwrap_err();
        assert!(err.to_string().contains("array of two numbers"));
    }

    #[test]
    fn test_readonly_shape_properties() {
        let engine = engine();
        assert_abs_diff_eq!(
            engine
                .eval::<f64>("CircularObject(0.25, 0.1, 2.0).radius")
                .unwrap(),
            0.25
        );
        assert!(engine
            .eval::<bool>("CircularObject(0.25, 0.1, 2.0).is_cylindric")
            .unwrap());
        assert!(!engine
            .eval::<bool>("RectangularObject(0.3, 0.4, 0.1, 2.0).is_cylindric")
            .unwrap());
        assert_abs_diff_eq!(
            engine
                .eval::<f64>("RectangularObject(0.3, 0.4, 0.1, 2.0).radius")
                .unwrap(),
            0.25
        );
    }

    #[test]
    fn test_robot_members_rejected_on_passive_objects() {
        let engine = engine();
        let err = engine
            .eval::<f64>("CircularObject(0.1, 0.1, 1.0).left_speed")
            .unwrap_err();
        assert!(err.to_string().contains("only available on robots"));
    }

    #[test]
    fn test_robot_wheel_speeds_coerce_integers() {
        let engine = engine();
        let mut scope = puck_scope();
        let speed: f64 = engine
            .eval_with_scope(&mut scope, "r.left_speed = 2; r.right_speed = -1.5; r.left_speed")
            .unwrap();
        assert_abs_diff_eq!(speed, 2.0);
    }

    #[test]
    fn test_camera_image_requires_capability() {
        let engine = engine();
        let mut scope = Scope::new();
        scope.push(
            "r",
            ObjectHandle::puck(Puck::new(PuckCapability {
                base_sensors: true,
                camera: false,
            })),
        );
        let err = engine
            .eval_with_scope::<TextureHandle>(&mut scope, "r.camera_image")
            .unwrap_err();
        assert!(err.to_string().contains("no camera"));
    }

    #[test]
    fn test_sensor_arrays_have_fixed_length() {
        let engine = engine();
        let mut scope = puck_scope();
        let values: Array = engine
            .eval_with_scope(&mut scope, "r.proximity_sensor_values")
            .unwrap();
        assert_eq!(values.len(), crate::domain::PROXIMITY_SENSOR_COUNT);
    }

    #[test]
    fn test_color_constructors_and_operators() {
        let engine = engine();
        let color: Color = engine.eval("Color(1, 0, 0) + Color(0, 0, 1)").unwrap();
        assert_eq!(color, Color::new(1.0, 0.0, 1.0, 2.0));

        let scaled: Color = engine.eval("Color(0.5, 0.5, 0.5, 1.0) * 2").unwrap();
        assert_eq!(scaled, Color::new(1.0, 1.0, 1.0, 2.0));

        assert!(engine.eval::<bool>("Color() == Color(0, 0, 0)").unwrap());
    }

    #[test]
    fn test_color_components_property() {
        let engine = engine();
        let components: Array = engine
            .eval("let c = Color(); c.components = [0.1, 0.2, 0.3, 0.4]; c.components")
            .unwrap();
        assert_eq!(components.len(), 4);
        assert_abs_diff_eq!(components[3].as_float().unwrap(), 0.4);

        let err = engine
            .eval::<()>("let c = Color(); c.components = [0.1, 0.2, 0.3];")
            .unwrap_err();
        assert!(err.to_string().contains("exactly 4"));
    }

    #[test]
    fn test_failed_components_write_leaves_color_unchanged() {
        let engine = engine();
        let components: Array = engine
            .eval(
                "let c = Color(); \
                 c.components = [0.1, 0.2, 0.3, 0.4]; \
                 try { c.components = [0.9, 0.9, 0.9]; } catch {} \
                 c.components",
            )
            .unwrap();
        let read: Vec<f64> = components.iter().map(|v| v.as_float().unwrap()).collect();
        assert_eq!(read, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_texture_indexing() {
        let engine = engine();
        let color: Color = engine
            .eval("let t = Texture(); t.push(Color(1, 0, 0)); t[0] = Color(0, 1, 0); t[0]")
            .unwrap();
        assert_eq!(color, Color::GREEN);

        let err = engine
            .eval::<Color>("let t = Texture(); t[3]")
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_world_add_remove_and_contains() {
        let engine = engine();
        let count: i64 = engine
            .eval(
                "let w = World(2.0, 2.0); \
                 let o = CircularObject(0.1, 0.1, 1.0); \
                 w.add_object(o); \
                 w.object_count",
            )
            .unwrap();
        assert_eq!(count, 1);

        let contains: bool = engine
            .eval(
                "let w = World(); \
                 let o = CircularObject(0.1, 0.1, 1.0); \
                 w.add_object(o); \
                 w.remove_object(o); \
                 w.contains(o)",
            )
            .unwrap();
        assert!(!contains);
    }

    #[test]
    fn test_double_add_is_an_error() {
        let engine = engine();
        let err = engine
            .eval::<()>(
                "let w = World(); \
                 let o = CircularObject(0.1, 0.1, 1.0); \
                 w.add_object(o); \
                 w.add_object(o);",
            )
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_world_owned_object_poisoned_after_removal() {
        let engine = engine();
        let err = engine
            .eval::<Array>(
                "let w = World(); \
                 w.take_object_ownership(true); \
                 let o = CircularObject(0.1, 0.1, 1.0); \
                 w.add_object(o); \
                 w.remove_object(o); \
                 o.pos",
            )
            .unwrap_err();
        assert!(err.to_string().contains("destroyed"));
    }

    #[test]
    fn test_ownership_fixed_after_first_add() {
        let engine = engine();
        let err = engine
            .eval::<()>(
                "let w = World(); \
                 w.add_object(CircularObject(0.1, 0.1, 1.0)); \
                 w.take_object_ownership(true);",
            )
            .unwrap_err();
        assert!(err.to_string().contains("while the world is empty"));
    }

    #[test]
    fn test_world_constructor_disambiguation() {
        let engine = engine();
        // radius + color is a disc, two numbers a rectangle
        let handle: WorldHandle = engine.eval("World(2.0, Color(1, 0, 0))").unwrap();
        assert!(matches!(
            handle.0.borrow().arena(),
            crate::domain::Arena::Circular { .. }
        ));
        let handle: WorldHandle = engine.eval("World(2.0, 3.0)").unwrap();
        assert!(matches!(
            handle.0.borrow().arena(),
            crate::domain::Arena::Bounded { .. }
        ));
    }

    #[test]
    fn test_default_walls_color_is_opaque_black() {
        let engine = engine();
        let handle: WorldHandle = engine.eval("World(2.0, 3.0)").unwrap();
        assert_eq!(
            handle.0.borrow().arena().walls_color(),
            Some(Color::BLACK)
        );
        let handle: WorldHandle = engine.eval("World(2.0)").unwrap();
        assert_eq!(
            handle.0.borrow().arena().walls_color(),
            Some(Color::BLACK)
        );
    }

    #[test]
    fn test_seeded_world_random_deterministic() {
        let engine = engine();
        let script = "let w = World(); w.set_random_seed(7); w.random(0.0, 1.0)";
        let first: f64 = engine.eval(script).unwrap();
        let second: f64 = engine.eval(script).unwrap();
        assert_abs_diff_eq!(first, second);
    }

    #[test]
    fn test_handle_identity_equality() {
        let engine = engine();
        assert!(engine
            .eval::<bool>("let o = CircularObject(0.1, 0.1, 1.0); let p = o; o == p")
            .unwrap());
        assert!(engine
            .eval::<bool>(
                "CircularObject(0.1, 0.1, 1.0) != CircularObject(0.1, 0.1, 1.0)"
            )
            .unwrap());
    }
}
