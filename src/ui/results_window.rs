use gdk::keys::constants as key;
use gtk::prelude::*;
use gtk::{Align, Box as GtkBox, Button, Grid, Label, Orientation, Window, WindowPosition, WindowType};

use crate::report::BenchmarkReport;

/// Window listing the scores of a finished run
pub struct ResultsWindow {
    window: Window,
}

impl ResultsWindow {
    pub fn new(report: &BenchmarkReport) -> Self {
        let window = Window::new(WindowType::Toplevel);
        window.set_title("System Benchmark Results");
        window.set_position(WindowPosition::Center);
        window.set_resizable(false);

        if let Some(accessible) = window.accessible() {
            accessible.set_name("System Benchmark Results");
            accessible.set_description("Per-resource scores and the overall score of the benchmark run");
        }

        let main_box = GtkBox::new(Orientation::Vertical, 12);
        main_box.set_margin_top(12);
        main_box.set_margin_bottom(12);
        main_box.set_margin_start(12);
        main_box.set_margin_end(12);

        let grid = Grid::new();
        grid.set_row_spacing(6);
        grid.set_column_spacing(12);

        for (row, (label_text, value_text)) in report.rows().into_iter().enumerate() {
            let label = Label::new(Some(&label_text));
            label.set_halign(Align::Start);

            let value = Label::new(Some(&value_text));
            value.set_halign(Align::Start);
            value.set_selectable(true);
            if let Some(accessible) = value.accessible() {
                accessible.set_name(&format!("{label_text} {value_text}"));
                accessible.set_role(atk::Role::Text);
            }

            grid.attach(&label, 0, row as i32, 1, 1);
            grid.attach(&value, 1, row as i32, 1, 1);
        }
        main_box.pack_start(&grid, false, false, 0);

        let close_button = Button::with_label("Close");
        close_button.set_halign(Align::End);
        if let Some(accessible) = close_button.accessible() {
            accessible.set_name("Close");
            accessible.set_description("Close the results window");
        }
        main_box.pack_start(&close_button, false, false, 0);

        window.add(&main_box);

        let window_weak = window.downgrade();
        close_button.connect_clicked(move |_| {
            if let Some(window) = window_weak.upgrade() {
                window.close();
            }
        });

        window.connect_key_press_event(|window, event| {
            if event.keyval() == key::Escape {
                window.close();
                return glib::Propagation::Stop;
            }
            glib::Propagation::Proceed
        });

        window.connect_delete_event(|_, _| {
            gtk::main_quit();
            glib::Propagation::Proceed
        });

        Self { window }
    }

    pub fn show(&self) {
        self.window.show_all();
    }
}

/// Show the results and block until the window is closed
pub fn show_results(report: &BenchmarkReport) -> Result<(), glib::BoolError> {
    gtk::init()?;
    glib::set_application_name("System Bench");

    let results = ResultsWindow::new(report);
    results.show();
    gtk::main();
    Ok(())
}
