pub mod categories;
pub mod dishes;
pub mod order_lines;
pub mod orders;
pub mod ratings;
pub mod users;

pub use categories::Entity as Categories;
pub use dishes::Entity as Dishes;
pub use order_lines::Entity as OrderLines;
pub use orders::Entity as Orders;
pub use ratings::Entity as Ratings;
pub use users::Entity as Users;
