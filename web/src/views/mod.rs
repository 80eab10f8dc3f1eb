mod sign_in;
pub use sign_in::SignIn;

mod dashboard;
pub use dashboard::Dashboard;

mod admin;
pub use admin::AdminDashboard;
