/// Token accounts traded by a pool and the messages that move them
pub mod asset;
/// Moving average price math
pub mod oracle;
/// Pool messages, responses and errors
pub mod pool;
/// Balance queries
pub mod querier;
