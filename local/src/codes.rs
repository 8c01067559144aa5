//! Response codes reported by [`LocalScheduler`](crate::LocalScheduler).

use zone_types::ResponseCode;

pub const SUCCESS: ResponseCode = ResponseCode::SUCCESS;
pub const INTERNAL_ERROR: ResponseCode = ResponseCode::new(1);
pub const TIMEOUT: ResponseCode = ResponseCode::new(2);
pub const BROADCAST_SCRIPT_ERROR: ResponseCode = ResponseCode::new(3);
pub const EXECUTE_FUNC_ERROR: ResponseCode = ResponseCode::new(4);
pub const FUNCTION_NOT_FOUND: ResponseCode = ResponseCode::new(5);
