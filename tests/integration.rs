//! Integration tests for weft-tui.
//!
//! These exercise the public API from outside the crate: the reactive
//! graph end-to-end, templates mounted on headless screens, layout splits,
//! and the diff wire format replayed back onto a buffer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use weft_tui::testing::{apply_ansi, buffer_to_string, CaptureWriter};
use weft_tui::{
    batch, boxed, cell, col, create_effect, derived, fixed, flex, render, row, template,
    layout::IntoContent, render::IntoArg, Screen,
};

fn capture_screen(w: i32, h: i32) -> (Screen, CaptureWriter) {
    let writer = CaptureWriter::new();
    let screen = Screen::with_backend(w, h, Box::new(writer.clone()));
    (screen, writer)
}

// ---------------------------------------------------------------------------
// Reactive graph scenarios
// ---------------------------------------------------------------------------

#[test]
fn counter_effect_runs_per_distinct_write() {
    let count = cell(0);
    let runs = Arc::new(AtomicUsize::new(0));

    let (cv, rv) = (count.clone(), runs.clone());
    let _effect = create_effect(move || {
        let _ = cv.get();
        rv.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    count.set(1);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    count.set(1); // equal value: no notification
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    count.set(2);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[test]
fn derived_is_lazy_and_memoized() {
    let a = cell(1);
    let evals = Arc::new(AtomicUsize::new(0));

    let (av, ev) = (a.clone(), evals.clone());
    let d = derived(move || {
        ev.fetch_add(1, Ordering::SeqCst);
        av.get() * 2
    });

    assert_eq!(evals.load(Ordering::SeqCst), 0);
    assert_eq!(d.get(), 2);
    assert_eq!(d.get(), 2);
    assert_eq!(evals.load(Ordering::SeqCst), 1);

    a.set(5);
    assert_eq!(evals.load(Ordering::SeqCst), 1); // still lazy
    assert_eq!(d.get(), 10);
    assert_eq!(evals.load(Ordering::SeqCst), 2);
}

#[test]
fn conditional_dependency_switches_subscriptions() {
    let flag = cell(true);
    let a = cell(10);
    let b = cell(20);
    let runs = Arc::new(AtomicUsize::new(0));

    let (fv, av, bv, rv) = (flag.clone(), a.clone(), b.clone(), runs.clone());
    let _effect = create_effect(move || {
        rv.fetch_add(1, Ordering::SeqCst);
        if fv.get() {
            let _ = av.get();
        } else {
            let _ = bv.get();
        }
    });

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    b.set(99);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    flag.set(false);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    a.set(77);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    b.set(100);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[test]
fn batch_coalesces_to_one_run() {
    let a = cell(1);
    let b = cell(1);
    let runs = Arc::new(AtomicUsize::new(0));

    let (av, bv, rv) = (a.clone(), b.clone(), runs.clone());
    let _effect = create_effect(move || {
        let _ = av.get();
        let _ = bv.get();
        rv.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    batch(|| {
        a.set(2);
        b.set(2);
    });
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn disposed_effect_never_runs_again() {
    let c = cell(0);
    let runs = Arc::new(AtomicUsize::new(0));

    let (cv, rv) = (c.clone(), runs.clone());
    let effect = create_effect(move || {
        let _ = cv.get();
        rv.fetch_add(1, Ordering::SeqCst);
    });

    effect.dispose();
    for i in 1..10 {
        c.set(i);
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn producer_thread_drives_render_state() {
    let c = cell(0);
    let seen = Arc::new(AtomicUsize::new(0));

    let (cv, sv) = (c.clone(), seen.clone());
    let _effect = create_effect(move || {
        sv.store(cv.get() as usize, Ordering::SeqCst);
    });

    let writer = c.clone();
    let handle = std::thread::spawn(move || {
        writer.set(41);
    });
    handle.join().expect("producer thread");
    assert_eq!(seen.load(Ordering::SeqCst), 41);
}

// ---------------------------------------------------------------------------
// Template scenarios
// ---------------------------------------------------------------------------

#[test]
fn template_holes_render_bound_cells() {
    let (screen, _out) = capture_screen(80, 24);
    let first = cell(3);
    let second = cell(7);

    let (fv, sv) = (first.clone(), second.clone());
    let _view = render(&screen, move || {
        template!("Count: **%v** / %v", fv.clone(), sv.clone())
    });

    let grid = buffer_to_string(&screen.back_snapshot());
    assert_eq!(grid.lines().next(), Some("Count: 3 / 7"));
    // Only the first row holds content; everything else stayed blank.
    assert!(grid.lines().skip(1).all(str::is_empty));

    // The bold wrapper styles the first hole's digit.
    assert!(screen.back_cell(7, 0).style.bold);
    assert_eq!(screen.back_cell(11, 0).ch, '7');

    first.set(4);
    let grid = buffer_to_string(&screen.back_snapshot());
    assert_eq!(grid.lines().next(), Some("Count: 4 / 7"));
}

#[test]
fn full_dialect_renders_together() {
    let (screen, _out) = capture_screen(40, 12);
    let _view = render(&screen, || {
        template!("# Head\n- item\n> quote\n---\n```\ncode\n```")
    });

    let grid = buffer_to_string(&screen.back_snapshot());
    let lines: Vec<&str> = grid.lines().collect();
    assert_eq!(lines[0], "Head");
    assert_eq!(lines[1], "• item");
    assert_eq!(lines[2], "│ quote");
    assert!(lines[3].starts_with("────"));
    assert_eq!(lines[4], "code");
}

#[test]
fn derived_cell_in_hole_tracks_sources() {
    let (screen, _out) = capture_screen(30, 3);
    let status = cell(String::from("loading"));

    let sv = status.clone();
    let view_text = derived(move || {
        if sv.get() == "loading" {
            String::from("#yellow(wait)")
        } else {
            String::from("#green(ok)")
        }
    });

    let dv = view_text.clone();
    let _view = render(&screen, move || template!("s: %v", dv.clone()));

    assert_eq!(screen.back_cell(3, 0).ch, 'w');
    assert_eq!(
        screen.back_cell(3, 0).style.fg,
        Some(weft_tui::Color::Yellow)
    );

    status.set(String::from("done"));
    assert_eq!(screen.back_cell(3, 0).ch, 'o');
    assert_eq!(screen.back_cell(3, 0).style.fg, Some(weft_tui::Color::Green));
}

// ---------------------------------------------------------------------------
// Layout scenarios
// ---------------------------------------------------------------------------

#[test]
fn flex_splits_match_weights() {
    // Two flex(1) children at width 20: 10 each.
    let left = col(vec![]).with_width(flex(1)).shared();
    let right = col(vec![]).with_width(flex(1)).shared();
    let even = row(vec![
        left.clone().into_content(),
        right.clone().into_content(),
    ])
    .with_width(fixed(20));
    even.measure(20, 5);
    assert_eq!(left.computed_size().0, 10);
    assert_eq!(right.computed_size().0, 10);

    // flex(1) against flex(3) at width 20: 5 and 15.
    let left = col(vec![]).with_width(flex(1)).shared();
    let right = col(vec![]).with_width(flex(3)).shared();
    let weighted = row(vec![
        left.clone().into_content(),
        right.clone().into_content(),
    ])
    .with_width(fixed(20));
    weighted.measure(20, 5);
    assert_eq!(left.computed_size().0, 5);
    assert_eq!(right.computed_size().0, 15);
}

#[test]
fn dashboard_layout_renders_boxes() {
    let (screen, _out) = capture_screen(40, 10);
    let selected = cell(0usize);

    let sv = selected.clone();
    let sidebar = derived(move || {
        let idx = sv.get();
        let items = ["Dashboard", "Settings", "Logs"];
        let rows: Vec<_> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let label = if i == idx {
                    format!("> {item}")
                } else {
                    (*item).to_string()
                };
                boxed(label, false, 0).into_content()
            })
            .collect();
        boxed(col(rows), true, 0)
            .with_width(fixed(16))
            .with_height(fixed(8))
            .shared()
    });

    let dv = sidebar.clone();
    let _view = render(&screen, move || template!("%v", dv.clone()));

    let grid = buffer_to_string(&screen.back_snapshot());
    assert!(grid.contains("> Dashboard"), "grid:\n{grid}");
    assert!(grid.contains('┌'), "grid:\n{grid}");

    selected.set(2);
    let grid = buffer_to_string(&screen.back_snapshot());
    assert!(grid.contains("> Logs"), "grid:\n{grid}");
    assert!(!grid.contains("> Dashboard"), "grid:\n{grid}");
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[test]
fn replayed_stream_reproduces_back_buffer() {
    let (screen, out) = capture_screen(24, 6);
    let tick = cell(0);

    let tv = tick.clone();
    let _view = render(&screen, move || {
        template!("# tick %v\n**bold** and #red(color)", tv.clone())
    });

    // Replay every frame's bytes over a shadow of the terminal.
    let mut shadow = weft_tui::Buffer::new(24, 6);
    apply_ansi(&mut shadow, &out.take());
    assert_eq!(shadow, screen.front_snapshot());

    for i in 1..4 {
        tick.set(i);
        apply_ansi(&mut shadow, &out.take());
        assert_eq!(shadow, screen.front_snapshot(), "after tick {i}");
    }
}

#[test]
fn resize_invalidation_rewrites_every_cell() {
    let (screen, out) = capture_screen(8, 3);
    let tick = cell(0);
    let tv = tick.clone();
    let _view = render(&screen, move || template!("t %v", tv.clone()));
    out.take();

    screen.resize(10, 4);
    tick.set(1);

    // The next frame redraws the full 10×4 grid from scratch.
    let mut shadow = weft_tui::Buffer::new(10, 4);
    apply_ansi(&mut shadow, &out.take());
    assert_eq!(shadow, screen.front_snapshot());
    assert_eq!(shadow, screen.back_snapshot());
}

#[test]
fn missing_and_extra_args_are_tolerated() {
    let (screen, _out) = capture_screen(20, 3);
    let _view = render(&screen, || {
        weft_tui::render::template(
            "%v and %v",
            vec!["one".into_arg(), "two".into_arg(), "extra".into_arg()],
        )
    });
    let grid = buffer_to_string(&screen.back_snapshot());
    assert_eq!(grid.lines().next(), Some("one and two"));
}

#[test]
fn update_from_callback_rerenders() {
    // The same shape a key callback has: mutate a cell, observe a frame.
    let (screen, _out) = capture_screen(20, 3);
    let count = cell(0);

    let view_cell = count.clone();
    let _view = render(&screen, move || template!("n=%v", view_cell.clone()));
    assert_eq!(screen.back_cell(2, 0).ch, '0');

    count.update(|n| *n += 1);
    assert_eq!(screen.back_cell(2, 0).ch, '1');
}
