use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Height of a bordered single-line text box.
const INPUT_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 1;

/// Screen areas of every pane. Hidden panes get an empty rect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaneLayout {
    pub selector: Rect,
    pub format: Rect,
    pub groups: Rect,
    pub output: Rect,
    pub footer: Rect,
}

impl PaneLayout {
    pub fn compute(area: Rect, zoomed: bool, list_width: u16) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(FOOTER_HEIGHT)])
            .split(area);
        let (body, footer) = (rows[0], rows[1]);

        if zoomed {
            return Self {
                output: body,
                footer,
                ..Self::default()
            };
        }

        let body_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(INPUT_HEIGHT), Constraint::Min(1)])
            .split(body);
        let inputs = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(body_rows[0]);
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(list_width), Constraint::Min(1)])
            .split(body_rows[1]);

        Self {
            selector: inputs[0],
            format: inputs[1],
            groups: panes[0],
            output: panes[1],
            footer,
        }
    }

    /// Text area inside the output pane's borders: (width, height).
    pub fn output_inner(&self) -> (usize, usize) {
        (
            self.output.width.saturating_sub(2) as usize,
            self.output.height.saturating_sub(2) as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_layout() {
        let layout = PaneLayout::compute(Rect::new(0, 0, 100, 30), false, 20);
        assert_eq!(layout.footer, Rect::new(0, 29, 100, 1));
        assert_eq!(layout.selector.height, 3);
        assert_eq!(layout.selector.width + layout.format.width, 100);
        assert_eq!(layout.groups, Rect::new(0, 3, 20, 26));
        assert_eq!(layout.output, Rect::new(20, 3, 80, 26));
        assert_eq!(layout.output_inner(), (78, 24));
    }

    #[test]
    fn test_zoomed_layout_gives_output_everything() {
        let layout = PaneLayout::compute(Rect::new(0, 0, 100, 30), true, 20);
        assert_eq!(layout.output, Rect::new(0, 0, 100, 29));
        assert_eq!(layout.groups, Rect::default());
        assert_eq!(layout.selector, Rect::default());
        assert_eq!(layout.output_inner(), (98, 27));
    }

    #[test]
    fn test_tiny_terminal_does_not_underflow() {
        let layout = PaneLayout::compute(Rect::new(0, 0, 1, 1), false, 12);
        let (w, h) = layout.output_inner();
        assert_eq!((w, h), (0, 0));
    }
}
