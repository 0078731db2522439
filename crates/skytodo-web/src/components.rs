mod auth_panel;
mod edit_modal;
mod priority_select;
mod session_bar;
mod task_form;
mod task_list;
mod task_list_row;
mod view_controls;

pub use auth_panel::AuthPanel;
pub use edit_modal::EditModal;
pub use priority_select::PrioritySelect;
pub use session_bar::SessionBar;
pub use task_form::TaskForm;
pub use task_list::TaskList;
pub use task_list_row::TaskListRow;
pub use view_controls::ViewControls;
