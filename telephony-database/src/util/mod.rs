/*!
 Utility modules shared by the export walkers and import reconcilers
*/

pub mod filters;
pub mod names;
