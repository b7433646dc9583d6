//! Fixed timestep simulation tick
//!
//! Per-tick flow: integrate bubble motion, rebuild the broad phase once,
//! then run every consumer of the grid against that single build -- click
//! popping (range query), autonomous poppers (random sampling), and
//! bubble-vs-bubble collisions (same-cell pair enumeration). The grid is
//! never queried across a tick boundary.

use std::ops::ControlFlow;

use glam::Vec2;
use rand_pcg::Pcg32;

use super::collision::resolve_collision;
use super::grid::SpatialGrid;
use super::state::{Bubble, Popper, SimState};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// World-space click position, if the player clicked this tick
    pub click: Option<Vec2>,
    /// Toggle the wind fan
    pub toggle_wind: bool,
}

/// Advance the simulation by one fixed timestep
pub fn tick(state: &mut SimState, input: &TickInput, dt: f32) {
    state.time_ticks += 1;

    if input.toggle_wind {
        state.wind_enabled = !state.wind_enabled;
        log::info!("wind {}", if state.wind_enabled { "on" } else { "off" });
    }

    integrate_bubbles(state, dt);

    // One broad-phase build per tick; every query below runs against it.
    // Pops replace bubbles in place, so the collection never changes shape
    // mid-tick and the grid's indices stay valid (positions of replaced
    // bubbles go stale, which the exact re-tests below absorb).
    let SimState {
        grid,
        bubbles,
        poppers,
        rng,
        popped,
        ..
    } = state;
    grid.rebuild(bubbles);

    if let Some(click) = input.click {
        handle_click(grid, bubbles, rng, popped, click);
    }

    update_poppers(grid, bubbles, poppers, rng, popped);

    resolve_bubble_collisions(grid, bubbles);
}

fn integrate_bubbles(state: &mut SimState, dt: f32) {
    let SimState {
        bubbles,
        rng,
        wind_enabled,
        ..
    } = state;

    for bubble in bubbles.iter_mut() {
        if *wind_enabled {
            bubble.vel += Vec2::splat(WIND_ACCEL) * dt;
        }
        bubble.vel.y += BUBBLE_FALL_ACCEL * dt;
        bubble.vel = bubble.vel.clamp_length_max(BUBBLE_MAX_SPEED);

        bubble.pos += bubble.vel * dt;

        // Horizontal wrap-around
        if bubble.pos.x - bubble.radius > WORLD_WIDTH {
            bubble.pos.x = -bubble.radius;
        } else if bubble.pos.x + bubble.radius < 0.0 {
            bubble.pos.x = WORLD_WIDTH + bubble.radius;
        }

        // Fallen off the bottom: recycle as a fresh bubble at the top
        if bubble.pos.y - bubble.radius > WORLD_HEIGHT {
            *bubble = Bubble::random_at_top(rng);
        }
    }
}

/// Pop the first bubble under the click, then everything in the multi-pop
/// radius around it.
fn handle_click(
    grid: &SpatialGrid,
    bubbles: &mut [Bubble],
    rng: &mut Pcg32,
    popped: &mut u64,
    click: Vec2,
) {
    // Candidate scan of the click's cell, exact containment re-test, stop at
    // the first hit
    let mut hit = None;
    grid.for_each_index_in_radius(click, 0.0, |index| {
        let bubble = &bubbles[index];
        if bubble.pos.distance_squared(click) <= bubble.radius * bubble.radius {
            hit = Some(index);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });

    let Some(hit) = hit else {
        return;
    };
    pop_bubble(bubbles, rng, popped, hit);

    // Chain-pop neighbors. Candidates can repeat across cells, so collect
    // and dedup before popping.
    let mut extra = Vec::new();
    grid.for_each_index_in_radius(click, MULTI_POP_RADIUS, |index| {
        if index != hit {
            let bubble = &bubbles[index];
            let reach = MULTI_POP_RADIUS + bubble.radius;
            if bubble.pos.distance_squared(click) <= reach * reach {
                extra.push(index);
            }
        }
        ControlFlow::Continue(())
    });
    extra.sort_unstable();
    extra.dedup();

    for index in extra {
        pop_bubble(bubbles, rng, popped, index);
    }
}

fn update_poppers(
    grid: &SpatialGrid,
    bubbles: &mut [Bubble],
    poppers: &mut [Popper],
    rng: &mut Pcg32,
    popped: &mut u64,
) {
    for popper in poppers.iter_mut() {
        if popper.cooldown_ticks > 0 {
            popper.cooldown_ticks -= 1;
            continue;
        }

        let center = popper.pos;
        let range_sq = popper.range * popper.range;

        // Approximate pick is fine here: the popper only needs *a* bubble,
        // not a fair one. Sampling can come up empty on a sparse field, in
        // which case the popper just tries again next tick.
        let found = grid.pick_random_index_in_radius_matching(rng, center, popper.range, |index| {
            bubbles[index].pos.distance_squared(center) <= range_sq
        });

        if let Some(index) = found {
            pop_bubble(bubbles, rng, popped, index);
            popper.cooldown_ticks = POPPER_COOLDOWN_TICKS;
            popper.pops += 1;
        }
    }
}

fn resolve_bubble_collisions(grid: &SpatialGrid, bubbles: &mut [Bubble]) {
    grid.for_each_unique_index_pair(|i, j| {
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let (head, tail) = bubbles.split_at_mut(hi);
        let (a, b) = (&mut head[lo], &mut tail[0]);

        if let Some(response) = resolve_collision(
            a.pos,
            b.pos,
            a.vel,
            b.vel,
            a.radius,
            b.radius,
            a.mass(),
            b.mass(),
        ) {
            a.pos += response.displacement_a;
            b.pos += response.displacement_b;
            a.vel += response.velocity_change_a;
            b.vel += response.velocity_change_b;
        }
    });
}

/// Replace a popped bubble with a fresh spawn at the top of the world,
/// keeping the collection's shape (and the grid's indices) intact.
fn pop_bubble(bubbles: &mut [Bubble], rng: &mut Pcg32, popped: &mut u64, index: usize) {
    bubbles[index] = Bubble::random_at_top(rng);
    *popped += 1;
}
