//! Debug panel: one widget per galaxy parameter.
//!
//! Widgets edit a draft copy of the parameters. A field is only reported
//! once its edit is finished (drag released, text field left, discrete
//! click), and only if the value actually moved away from the last
//! committed one. Commits come back from [`ControlPanel::show`] as
//! [`ParamUpdate`]s for the host to apply.

use crate::params::{Color, GalaxyParams, ParamName, ParamUpdate};

/// Interaction state of a widget for the frame just drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditState {
    pub changed: bool,
    pub dragged: bool,
    pub drag_stopped: bool,
    pub has_focus: bool,
    pub lost_focus: bool,
}

impl EditState {
    pub fn from_response(response: &egui::Response) -> Self {
        Self {
            changed: response.changed(),
            dragged: response.dragged(),
            drag_stopped: response.drag_stopped(),
            has_focus: response.has_focus(),
            lost_focus: response.lost_focus(),
        }
    }

    /// Whether this frame finishes an edit.
    ///
    /// Mid-drag values and keystrokes in a focused text box are not
    /// commits; releasing the drag or leaving the box is.
    pub fn is_commit(&self) -> bool {
        self.drag_stopped || self.lost_focus || (self.changed && !self.dragged && !self.has_focus)
    }
}

/// Parameter panel state.
pub struct ControlPanel {
    draft: GalaxyParams,
    committed: GalaxyParams,
    inside_hex: String,
    outside_hex: String,
}

impl ControlPanel {
    pub fn new(params: &GalaxyParams) -> Self {
        Self {
            draft: params.clone(),
            committed: params.clone(),
            inside_hex: params.inside_color.to_hex(),
            outside_hex: params.outside_color.to_hex(),
        }
    }

    /// Draw the panel and return the edits finished this frame.
    pub fn show(&mut self, ctx: &egui::Context) -> Vec<ParamUpdate> {
        let mut commits = Vec::new();
        egui::Window::new("Galaxy")
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                self.ui(ui, &mut commits);
            });
        commits
    }

    fn ui(&mut self, ui: &mut egui::Ui, commits: &mut Vec<ParamUpdate>) {
        let state = slider(ui, ParamName::Count, &mut self.draft.count);
        self.commit_if(state, ParamUpdate::Count(self.draft.count), commits);

        let state = slider(ui, ParamName::Size, &mut self.draft.size);
        self.commit_if(state, ParamUpdate::Size(self.draft.size), commits);

        let state = slider(ui, ParamName::Radius, &mut self.draft.radius);
        self.commit_if(state, ParamUpdate::Radius(self.draft.radius), commits);

        let state = slider(ui, ParamName::Branches, &mut self.draft.branches);
        self.commit_if(state, ParamUpdate::Branches(self.draft.branches), commits);

        let state = slider(ui, ParamName::Spin, &mut self.draft.spin);
        self.commit_if(state, ParamUpdate::Spin(self.draft.spin), commits);

        let state = slider(ui, ParamName::Randomness, &mut self.draft.randomness);
        self.commit_if(state, ParamUpdate::Randomness(self.draft.randomness), commits);

        let state = slider(ui, ParamName::Power, &mut self.draft.power);
        self.commit_if(state, ParamUpdate::Power(self.draft.power), commits);

        ui.separator();

        if let Some(color) = hex_field(ui, ParamName::InsideColor, &mut self.inside_hex, self.committed.inside_color) {
            self.draft.inside_color = color;
            self.commit(ParamUpdate::InsideColor(color), commits);
        }
        if let Some(color) = hex_field(ui, ParamName::OutsideColor, &mut self.outside_hex, self.committed.outside_color) {
            self.draft.outside_color = color;
            self.commit(ParamUpdate::OutsideColor(color), commits);
        }
    }

    fn commit_if(&mut self, state: EditState, update: ParamUpdate, commits: &mut Vec<ParamUpdate>) {
        if state.is_commit() {
            self.commit(update, commits);
        }
    }

    /// Record `update` unless it matches the last committed value.
    fn commit(&mut self, update: ParamUpdate, commits: &mut Vec<ParamUpdate>) {
        let mut next = self.committed.clone();
        next.apply(update);
        if next != self.committed {
            self.committed = next;
            commits.push(update);
        }
    }
}

/// Numeric slider bound to one field, snapped to the field's step.
fn slider<N: egui::emath::Numeric>(ui: &mut egui::Ui, name: ParamName, value: &mut N) -> EditState {
    let Some(range) = name.range() else {
        return EditState::default();
    };

    let mut response = ui.add(
        egui::Slider::new(value, N::from_f64(range.min)..=N::from_f64(range.max))
            .step_by(range.step)
            .text(name.as_str()),
    );
    if name == ParamName::Randomness {
        response = response.on_hover_text("Stored only; jitter is shaped by power");
    }

    let state = EditState::from_response(&response);
    if state.is_commit() {
        *value = N::from_f64(range.snap(value.to_f64()));
    }
    state
}

/// Hex text box with a swatch. Returns the parsed color when the box is
/// left with valid input; invalid input reverts to `fallback`.
fn hex_field(ui: &mut egui::Ui, name: ParamName, text: &mut String, fallback: Color) -> Option<Color> {
    ui.horizontal(|ui| {
        let shown = Color::from_hex(text).unwrap_or(fallback).to_srgb_u8();
        egui::color_picker::show_color(
            ui,
            egui::Color32::from_rgb(shown[0], shown[1], shown[2]),
            egui::vec2(16.0, 16.0),
        );

        let response = ui.add(egui::TextEdit::singleline(text).desired_width(80.0));
        ui.label(name.as_str());

        if !response.lost_focus() {
            return None;
        }
        match Color::from_hex(text) {
            Ok(color) => {
                *text = color.to_hex();
                Some(color)
            }
            Err(e) => {
                log::warn!("ignoring {} = {:?}: {}", name, text, e);
                *text = fallback.to_hex();
                None
            }
        }
    })
    .inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_drag_is_not_a_commit() {
        let state = EditState { changed: true, dragged: true, ..Default::default() };
        assert!(!state.is_commit());
    }

    #[test]
    fn test_drag_release_commits() {
        let state = EditState { drag_stopped: true, ..Default::default() };
        assert!(state.is_commit());
    }

    #[test]
    fn test_typing_waits_for_focus_loss() {
        let typing = EditState { changed: true, has_focus: true, ..Default::default() };
        assert!(!typing.is_commit());
        let left = EditState { lost_focus: true, ..Default::default() };
        assert!(left.is_commit());
    }

    #[test]
    fn test_click_commits() {
        let click = EditState { changed: true, ..Default::default() };
        assert!(click.is_commit());
        assert!(!EditState::default().is_commit());
    }

    #[test]
    fn test_unchanged_value_is_not_recommitted() {
        let params = GalaxyParams::default();
        let mut panel = ControlPanel::new(&params);
        let mut commits = Vec::new();
        let done = EditState { drag_stopped: true, ..Default::default() };

        panel.commit_if(done, ParamUpdate::Count(params.count), &mut commits);
        assert!(commits.is_empty());

        panel.commit_if(done, ParamUpdate::Count(50_000), &mut commits);
        panel.commit_if(done, ParamUpdate::Count(50_000), &mut commits);
        assert_eq!(commits, [ParamUpdate::Count(50_000)]);
    }

    #[test]
    fn test_draft_starts_from_params() {
        let params = GalaxyParams { count: 1234, ..Default::default() };
        let panel = ControlPanel::new(&params);
        assert_eq!(panel.draft.count, 1234);
        assert_eq!(panel.inside_hex, "#ff6030");
    }
}
