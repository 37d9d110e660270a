use agroadmin::lifecycle::LifecycleFilter;
use console::Style;
use once_cell::sync::Lazy;

pub struct Styles {
    pub index_active: Style,
    pub index_archived: Style,
    pub index_deleted: Style,
    pub time: Style,
    pub heading: Style,
    pub link: Style,
}

pub static STYLES: Lazy<Styles> = Lazy::new(|| Styles {
    index_active: Style::new(),
    index_archived: Style::new().cyan(),
    index_deleted: Style::new().red(),
    time: Style::new().color256(247).italic(),
    heading: Style::new().bold(),
    link: Style::new().underlined().blue(),
});

impl Styles {
    pub fn index(&self, filter: LifecycleFilter) -> &Style {
        match filter {
            LifecycleFilter::Active => &self.index_active,
            LifecycleFilter::Archived => &self.index_archived,
            LifecycleFilter::Deleted => &self.index_deleted,
        }
    }
}
