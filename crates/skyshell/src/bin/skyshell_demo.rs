//! Headless firework show.
//!
//! Runs a scripted show through the full stack minus the GPU and the
//! network: real engine, real session, real frame preparation, with the
//! per-frame draw lists logged instead of drawn. Useful as a smoke test
//! and as a readable example of driving a [`FireworkSession`].
//!
//! ```text
//! RUST_LOG=info cargo run --bin skyshell_demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use skyshell::{FireworkSession, SessionConfig};
use skyshell_shared::{epoch_seconds, Color, Mat4, ShellDefinition, StarLayout, StarShape, Vec2,
    Vec3};

fn ring_shell(name: &str, stars: usize, radius: f32, color: Color) -> Arc<ShellDefinition> {
    let stars = (0..stars)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = i as f32 / stars as f32 * std::f32::consts::TAU;
            StarLayout {
                position: Vec2::new(angle.cos() * radius, angle.sin() * radius),
                color,
                shape: StarShape::Circle,
                size: 4.0,
            }
        })
        .collect();
    Arc::new(ShellDefinition {
        name: name.to_string(),
        stars,
        shell_radius: radius,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let (mut session, mut commands) = FireworkSession::new(&SessionConfig::default());
    session.on_camera_update(
        Mat4::look_at(Vec3::new(0.0, 1.6, 5.0), Vec3::new(0.0, 8.0, -5.0), Vec3::Y),
        Mat4::perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 200.0),
    );

    let shells = [
        ring_shell("crimson ring", 24, 80.0, Color::new(1.0, 0.25, 0.2, 1.0)),
        ring_shell("gold ring", 32, 60.0, Color::new(1.0, 0.85, 0.3, 1.0)),
        ring_shell("violet ring", 16, 95.0, Color::new(0.7, 0.3, 1.0, 1.0)),
    ];
    for (i, shell) in shells.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = (i as f32 - 1.0) * 3.0;
        if let Err(err) = session.launch_at(
            Some(Arc::clone(shell)),
            Vec3::new(x, 0.0, -6.0),
            epoch_seconds() + i as f64,
        ) {
            tracing::error!(error = %err, "launch failed");
        }
    }

    // 60 Hz tick loop, chained by redraw_needed like a real host would.
    let dt = 1.0 / 60.0;
    let mut frames = 0u64;
    loop {
        let frame = session.on_render_tick(dt, epoch_seconds());
        frames += 1;
        if frames % 60 == 0 {
            let stats = session.sim_stats();
            tracing::info!(
                draws = frame.stats.draw_calls,
                risers = stats.live_risers,
                stars = stats.live_stars,
                "tick"
            );
        }
        // Ungrouped session: no transport, but drain its command feed so
        // the channel never backs up.
        while commands.try_recv().is_ok() {}
        for effect in session.drain_effects() {
            tracing::info!(?effect, "platform burst requested");
        }
        if !frame.redraw_needed {
            break;
        }
        std::thread::sleep(Duration::from_secs_f32(dt));
    }

    let stats = session.sim_stats();
    tracing::info!(
        risers = stats.risers_spawned,
        explosions = stats.explosions,
        stars = stats.stars_spawned,
        frames,
        "show complete"
    );
}
