#![forbid(unsafe_code)]

use poem_openapi::{payload::Json, Object, OpenApi};

use crate::utils::groupie_utils::{BuildInfo, BUILD_INFO};

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct VersionApi;

/** Build details of the running server. */
#[derive(Object)]
struct RespVersion
{
    result_code: String,
    result_msg: String,
    server_version: String,
    git_branch: String,
    git_commit: String,
    git_dirty: String,
    rustc_version: String,
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl VersionApi {
    #[oai(path = "/version", method = "get")]
    async fn get_version(&self) -> Json<RespVersion> {
        Json(RespVersion::from(&BUILD_INFO))
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl From<&BuildInfo> for RespVersion {
    fn from(info: &BuildInfo) -> Self {
        Self {
            result_code: "0".to_string(),
            result_msg: "success".to_string(),
            server_version: info.version.to_string(),
            git_branch: info.git_branch.to_string(),
            git_commit: info.git_commit.to_string(),
            git_dirty: info.git_dirty.to_string(),
            rustc_version: info.rustc_version.to_string(),
        }
    }
}
