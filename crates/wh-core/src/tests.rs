//! Unit tests for wh-core primitives.

#[cfg(test)]
mod ids {
    use crate::{BotId, PodId, WaypointId};

    #[test]
    fn index_roundtrip() {
        let id = BotId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(BotId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(BotId(0) < BotId(1));
        assert!(WaypointId(100) > WaypointId(99));
    }

    #[test]
    fn default_is_invalid() {
        assert_eq!(PodId::default(), PodId::INVALID);
        assert!(!PodId::default().is_valid());
        assert!(PodId(0).is_valid());
    }

    #[test]
    fn display() {
        assert_eq!(WaypointId(7).to_string(), "WaypointId(7)");
    }
}

#[cfg(test)]
mod geo {
    use std::f64::consts::{FRAC_PI_2, PI};

    use crate::geo::{angle_diff, normalize_angle};
    use crate::Point;

    #[test]
    fn distances() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(a.manhattan(b), 7.0);
    }

    #[test]
    fn heading() {
        let a = Point::ORIGIN;
        assert!((a.heading_to(Point::new(0.0, 1.0)) - FRAC_PI_2).abs() < 1e-12);
        assert!((a.heading_to(Point::new(-1.0, 0.0)) - PI).abs() < 1e-12);
    }

    #[test]
    fn step_towards_never_overshoots() {
        let a = Point::ORIGIN;
        let b = Point::new(1.0, 0.0);
        assert_eq!(a.step_towards(b, 0.25), Point::new(0.25, 0.0));
        assert_eq!(a.step_towards(b, 5.0), b);
    }

    #[test]
    fn angles_wrap() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < 1e-12);
        // Shortest rotation from +170° to -170° is +20°.
        let d = angle_diff(170f64.to_radians(), (-170f64).to_radians());
        assert!((d - 20f64.to_radians()).abs() < 1e-9, "got {d}");
    }

    #[test]
    fn disc_overlap() {
        let a = Point::ORIGIN;
        assert!(a.discs_overlap(0.5, Point::new(0.9, 0.0), 0.5));
        assert!(!a.discs_overlap(0.5, Point::new(1.0, 0.0), 0.5));
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimConfig, Tick, WhError};

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert_eq!(t.offset(3), Tick(13));
        assert_eq!(Tick(15).since(Tick(10)), 5);
        assert_eq!(Tick(3).since(Tick(10)), 0);
    }

    #[test]
    fn clock_now_is_tick_times_step() {
        let mut clock = SimClock::new(0.1, 1.0).unwrap();
        assert_eq!(clock.now(), 0.0);
        for _ in 0..3 {
            clock.advance();
        }
        assert_eq!(clock.now(), 3.0 * 0.1);
    }

    #[test]
    fn horizon_in_steps() {
        // Step and horizon that do not divide evenly round up.
        let clock = SimClock::new(0.1, 1.0).unwrap();
        assert_eq!(clock.end_tick, Tick(10));
        let clock = SimClock::new(0.3, 1.0).unwrap();
        assert_eq!(clock.end_tick, Tick(4));
    }

    #[test]
    fn at_horizon() {
        let mut clock = SimClock::new(0.5, 1.0).unwrap();
        assert!(!clock.at_horizon());
        clock.advance();
        assert_eq!(clock.remaining_steps(), 1);
        clock.advance();
        assert!(clock.at_horizon());
        clock.reset();
        assert_eq!(clock.current_tick, Tick::ZERO);
    }

    #[test]
    fn rejects_bad_step_and_horizon() {
        assert!(matches!(SimClock::new(0.0, 10.0), Err(WhError::Config(_))));
        assert!(matches!(SimClock::new(-0.1, 10.0), Err(WhError::Config(_))));
        assert!(matches!(SimClock::new(0.1, 0.0), Err(WhError::Config(_))));
        assert!(matches!(SimClock::new(f64::NAN, 1.0), Err(WhError::Config(_))));
    }

    #[test]
    fn config_defaults() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.time_step, 0.1);
        assert_eq!(cfg.duration, 3600.0);
        assert_eq!(cfg.seed, 42);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.make_clock().unwrap().end_tick, Tick(36_000));
    }

    #[test]
    fn config_validate_rejects_negative_duration() {
        let cfg = SimConfig { duration: -5.0, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = SimRng::new(12345);
        let mut r2 = SimRng::new(12345);
        for _ in 0..100 {
            let a: f64 = r1.random();
            let b: f64 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn children_are_deterministic_and_distinct() {
        let mut root1 = SimRng::new(7);
        let mut root2 = SimRng::new(7);
        let mut a = root1.child(1);
        let mut b = root2.child(1);
        assert_eq!(a.random::<u64>(), b.random::<u64>());

        let mut root = SimRng::new(7);
        let mut c1 = root.child(1);
        let mut c2 = root.child(2);
        assert_ne!(c1.random::<u64>(), c2.random::<u64>());
    }

    #[test]
    fn gen_range_in_bounds() {
        let mut rng = SimRng::new(0);
        for _ in 0..1000 {
            let v = rng.gen_range(0.0f64..1.0);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = SimRng::new(0);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SimRng::new(0);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[9]), Some(&9));
    }
}
