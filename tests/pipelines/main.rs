mod cover_pipeline;
