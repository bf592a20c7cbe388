pub mod contract;
pub mod contract_document;
pub mod covenant;
pub mod covenant_owner;
pub mod monitoring_result;
pub mod notification;
pub mod user;

pub use contract::{Contract, ContractInput};
pub use contract_document::{ContractDocument, ContractDocumentInput};
pub use covenant::{Covenant, CovenantInput};
pub use covenant_owner::{CovenantOwner, CovenantOwnerInput};
pub use monitoring_result::{MonitoringResult, MonitoringResultInput};
pub use notification::{NewNotification, Notification};
pub use user::{User, UserInput, UserProfile, UserRoles};
