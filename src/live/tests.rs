use std::sync::Arc;

use tokio::time::{self, Duration, Instant};

use crate::{
    command::{Twist, VelocityCommand},
    config::MuxConfig,
    mux::error::ArbiterError,
};

use super::{
    LiveMuxConfig, LiveMuxEngine, LiveMuxReceiver, LiveMuxStatus, LiveMuxUpdate, MuxDiagnostics,
    MuxOutput, error::LiveMuxError,
};

const MUX_CONFIG: &str = r#"{
    "topics": [
        { "name": "drive", "topic": "drive_vel", "timeout": 1.0, "priority": 1 },
        { "name": "teleop", "topic": "teleop_vel", "timeout": 0.5, "priority": 5 }
    ],
    "locks": [
        { "name": "estop", "topic": "estop", "timeout": 2.0, "priority": 10 }
    ]
}"#;

fn engine(config: LiveMuxConfig) -> LiveMuxEngine {
    let mux_config = MuxConfig::from_json_str(MUX_CONFIG).unwrap();
    LiveMuxEngine::new(config, &mux_config).unwrap()
}

async fn next_status(rx: &mut LiveMuxReceiver) -> LiveMuxStatus {
    loop {
        if let LiveMuxUpdate::Status(status) = rx.recv().await.unwrap() {
            return status;
        }
    }
}

async fn next_command(rx: &mut LiveMuxReceiver) -> MuxOutput {
    loop {
        if let LiveMuxUpdate::Command(output) = rx.recv().await.unwrap() {
            return output;
        }
    }
}

async fn next_diagnostics(rx: &mut LiveMuxReceiver) -> Arc<MuxDiagnostics> {
    loop {
        if let LiveMuxUpdate::Diagnostics(diagnostics) = rx.recv().await.unwrap() {
            return diagnostics;
        }
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn start_then_shutdown() {
        let engine = engine(LiveMuxConfig::default());
        assert!(matches!(engine.status_snapshot(), LiveMuxStatus::NotStarted));

        let mut rx = engine.update_receiver();
        let controller = engine.start();

        assert!(matches!(controller.status_snapshot(), LiveMuxStatus::Running));
        assert!(matches!(next_status(&mut rx).await, LiveMuxStatus::Running));

        // Let the diagnostics process run before stopping it
        let _ = next_diagnostics(&mut rx).await;

        controller.shutdown().await.unwrap();

        assert!(matches!(
            next_status(&mut rx).await,
            LiveMuxStatus::ShutdownInitiated
        ));
        assert!(matches!(next_status(&mut rx).await, LiveMuxStatus::Shutdown));
        assert!(matches!(controller.status_snapshot(), LiveMuxStatus::Shutdown));
        assert!(matches!(
            controller.until_stopped().await,
            LiveMuxStatus::Shutdown
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_first_poll_ends_in_shutdown() {
        let engine = engine(LiveMuxConfig::default());
        let mut rx = engine.update_receiver();
        let controller = engine.start();

        // The diagnostics task has not been polled yet
        controller.shutdown().await.unwrap();

        assert!(matches!(next_status(&mut rx).await, LiveMuxStatus::Running));
        assert!(matches!(
            next_status(&mut rx).await,
            LiveMuxStatus::ShutdownInitiated
        ));
        assert!(matches!(next_status(&mut rx).await, LiveMuxStatus::Shutdown));
        assert!(matches!(controller.status_snapshot(), LiveMuxStatus::Shutdown));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_can_only_run_once() {
        let controller = engine(LiveMuxConfig::default()).start();

        controller.shutdown().await.unwrap();

        assert!(matches!(
            controller.shutdown().await,
            Err(LiveMuxError::LiveMuxAlreadyShutdown)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn until_stopped_waits_for_shutdown() {
        let controller = engine(LiveMuxConfig::default()).start();

        let waiter = tokio::spawn({
            let controller = controller.clone();
            async move { controller.until_stopped().await }
        });

        time::sleep(Duration::from_secs(5)).await;
        assert!(!waiter.is_finished());

        controller.shutdown().await.unwrap();

        assert!(matches!(waiter.await.unwrap(), LiveMuxStatus::Shutdown));
    }

    #[tokio::test(start_paused = true)]
    async fn reader_follows_status() {
        let engine = engine(LiveMuxConfig::default());
        let reader = engine.reader();
        let controller = engine.start();

        controller.shutdown().await.unwrap();

        assert!(matches!(reader.status_snapshot(), LiveMuxStatus::Shutdown));
    }
}

mod diagnostics {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn reports_are_broadcast_every_period() {
        let controller = engine(LiveMuxConfig::default().with_diagnostics_period(500)).start();
        let mut rx = controller.update_receiver();

        let first = next_diagnostics(&mut rx).await;
        let start = Instant::now();
        let _second = next_diagnostics(&mut rx).await;
        let elapsed = Instant::now() - start;

        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(600));

        assert_eq!(first.snapshot.velocity_sources.len(), 2);
        assert_eq!(first.snapshot.locks.len(), 1);
        assert_eq!(first.snapshot.active_source, None);

        controller.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn reports_reflect_arbitration_state() {
        let controller = engine(LiveMuxConfig::default()).start();
        let mut rx = controller.update_receiver();

        controller.on_velocity("drive", Twist::planar(0.5, 0.0)).unwrap();
        controller.on_lock("estop", true).unwrap();

        let diagnostics = next_diagnostics(&mut rx).await;
        assert_eq!(diagnostics.snapshot.lock_priority.as_u32(), 10);
        assert_eq!(diagnostics.snapshot.active_source, None);
        assert!(diagnostics.snapshot.lock("estop").unwrap().locked);
        assert!(diagnostics.to_string().contains("lock priority: 10"));

        controller.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn on_demand_report() {
        let controller = engine(LiveMuxConfig::default()).start();

        controller.on_velocity("teleop", Twist::planar(0.2, 0.0)).unwrap();

        let diagnostics = controller.diagnostics();
        assert_eq!(diagnostics.snapshot.active_source.as_deref(), Some("teleop"));

        controller.shutdown().await.unwrap();
    }
}

mod arbitration {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn forwarded_commands_are_returned_and_broadcast() {
        let controller = engine(LiveMuxConfig::default()).start();
        let mut rx = controller.update_receiver();

        let twist = Twist::planar(0.3, 0.1);
        let out = controller.on_velocity("teleop", twist).unwrap();
        assert_eq!(out, Some(VelocityCommand::Bare(twist)));

        let output = next_command(&mut rx).await;
        assert_eq!(output.source, "teleop");
        assert_eq!(output.command, VelocityCommand::Bare(twist));

        controller.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn higher_priority_source_expires() {
        let controller = engine(LiveMuxConfig::default()).start();

        assert!(controller.on_velocity("teleop", Twist::default()).unwrap().is_some());
        assert!(controller.on_velocity("drive", Twist::default()).unwrap().is_none());

        time::advance(Duration::from_millis(600)).await;

        assert!(controller.on_velocity("drive", Twist::default()).unwrap().is_some());

        controller.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn lock_blocks_until_it_expires() {
        let controller = engine(LiveMuxConfig::default()).start();

        controller.on_lock("estop", true).unwrap();
        assert!(controller.on_velocity("drive", Twist::default()).unwrap().is_none());

        time::advance(Duration::from_secs(1)).await;
        assert!(controller.on_velocity("drive", Twist::default()).unwrap().is_none());

        time::advance(Duration::from_secs(2)).await;
        assert!(controller.on_velocity("drive", Twist::default()).unwrap().is_some());

        controller.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_channels_are_errors() {
        let controller = engine(LiveMuxConfig::default()).start();

        assert!(matches!(
            controller.on_velocity("ghost", Twist::default()),
            Err(LiveMuxError::Arbiter(ArbiterError::UnknownVelocitySource(_)))
        ));
        assert!(matches!(
            controller.on_lock("ghost", true),
            Err(LiveMuxError::Arbiter(ArbiterError::UnknownLockSource(_)))
        ));

        controller.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stamped_output_uses_reception_time() {
        let mux_config = MuxConfig::from_json_str(
            r#"{
                "output_stamped": true,
                "frame_id": "base_link",
                "topics": [
                    { "name": "drive", "topic": "drive_vel", "timeout": 1.0, "priority": 1 }
                ]
            }"#,
        )
        .unwrap();
        let controller = LiveMuxEngine::new(LiveMuxConfig::default(), &mux_config)
            .unwrap()
            .start();

        let twist = Twist::planar(1.0, 0.0);
        let out = controller.on_velocity("drive", twist).unwrap();

        match out {
            Some(VelocityCommand::Timestamped(stamped)) => {
                assert_eq!(stamped.stamp, Instant::now());
                assert_eq!(stamped.frame_id, "base_link");
                assert_eq!(stamped.twist, twist);
            }
            other => panic!("expected a timestamped command, got {other:?}"),
        }

        controller.shutdown().await.unwrap();
    }
}
