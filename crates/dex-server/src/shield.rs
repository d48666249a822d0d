//! Client side of the project/identity service.

use dex_proto::shield_v1beta1::{GetProjectRequest, GetProjectResponse, Project, shield_service};
use tonic::Status;

use crate::transport::GrpcTransport;

#[tonic::async_trait]
pub trait ProjectService: Send + Sync + 'static {
    async fn get_project(&self, id: &str) -> Result<Project, Status>;
}

#[derive(Clone)]
pub struct GrpcProjectService {
    transport: GrpcTransport,
}

impl GrpcProjectService {
    pub fn new(transport: GrpcTransport) -> Self {
        Self { transport }
    }
}

#[tonic::async_trait]
impl ProjectService for GrpcProjectService {
    async fn get_project(&self, id: &str) -> Result<Project, Status> {
        let req = GetProjectRequest { id: id.to_string() };
        let resp: GetProjectResponse = self
            .transport
            .unary(shield_service::GET_PROJECT, req)
            .await?;
        resp.project
            .ok_or_else(|| Status::internal("project service response has no project"))
    }
}
