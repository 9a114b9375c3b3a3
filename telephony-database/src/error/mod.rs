/*!
 This module contains types of errors that can happen when moving telephony data
*/

pub mod codec;
pub mod export;
pub mod import;
pub mod store;
