// Library root
// -----------
// The binary (`main.rs`) wires these modules into the interactive client.
//
// Module responsibilities:
// - `api`: the blocking HTTP client that POSTs one query to the ledis
//   server and classifies the result as a response or a connection error.
// - `ui`: the prompt loop, reading queries from the terminal (or a pipe)
//   and printing whatever the server answered.
// - `error`: failures the loop does not recover from.
pub mod api;
pub mod error;
pub mod ui;
